//! Run the allMovies query against the configured backend and print one movie per line.
//! Uses MOVIES_GRAPHQL_URL from the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movieform::graphql::{MovieApi, MoviesClient};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present for local runs.
    dotenv().ok();

    let endpoint =
        env::var("MOVIES_GRAPHQL_URL").context("Missing MOVIES_GRAPHQL_URL in environment")?;

    let client = MoviesClient::new(endpoint, Duration::from_secs(30))?;
    let movies = client
        .all_movies()
        .await
        .context("allMovies query failed")?;

    for movie in movies {
        let year = movie.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into());
        let rating = movie
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".into());
        println!("{}\t{}\t{}\t{}", movie.id, movie.title, year, rating);
    }

    Ok(())
}
