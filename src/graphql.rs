use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::{MovieId, MovieRecord, MovieUpdate, NewMovie};

const MOVIE_FIELDS: &str = "id title description poster_image year rating";

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn add_movie(&self, movie: NewMovie) -> Result<MovieRecord>;
    async fn update_movie(&self, movie: MovieUpdate) -> Result<MovieRecord>;
    async fn fetch_movie(&self, id: &MovieId) -> Result<Option<MovieRecord>>;
    /// Returns the cached `allMovies` listing, fetching it on first use.
    async fn all_movies(&self) -> Result<Vec<MovieRecord>>;
}

#[derive(Debug, Clone)]
pub struct MoviesClient {
    client: Client,
    endpoint: String,
    listing: Arc<RwLock<Option<Vec<MovieRecord>>>>,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
    path: Option<Vec<Value>>,
}

impl MoviesClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let user_agent = format!("movieform/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build GraphQL HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            listing: Arc::new(RwLock::new(None)),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });

        debug!("Sending GraphQL operation {}", operation);
        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("GraphQL {} request failed", operation))?;

        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .with_context(|| format!("Failed to read GraphQL {} body", operation))?;
        if !status.is_success() {
            return Err(anyhow!(
                "GraphQL {} HTTP error (status {}): {}",
                operation,
                status,
                String::from_utf8_lossy(&bytes)
            ));
        }

        decode_response(operation, &bytes)
    }

    /// Re-runs `allMovies` and replaces the cached listing.
    async fn refetch_all_movies(&self) -> Result<Vec<MovieRecord>> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "allMovies")]
            all_movies: Option<Vec<MovieRecord>>,
        }

        let query = format!("query allMovies {{\n  allMovies {{ {MOVIE_FIELDS} }}\n}}\n");
        let data: Data = self.execute("allMovies", &query, json!({})).await?;
        let movies = data.all_movies.unwrap_or_default();
        info!("Fetched {} movies", movies.len());
        *self.listing.write().await = Some(movies.clone());
        Ok(movies)
    }

    async fn refresh_after_mutation(&self, operation: &str) {
        if let Err(e) = self.refetch_all_movies().await {
            warn!("Failed to refetch allMovies after {}: {:#}", operation, e);
            *self.listing.write().await = None;
        }
    }
}

fn decode_response<T: DeserializeOwned>(operation: &str, bytes: &[u8]) -> Result<T> {
    let parsed: GraphQlResponse<T> = serde_json::from_slice(bytes)
        .with_context(|| format!("Failed to parse GraphQL {} JSON", operation))?;
    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        let msg = errors
            .into_iter()
            .map(|e| match e.path {
                Some(path) if !path.is_empty() => {
                    let path = path
                        .iter()
                        .map(|p| match p {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".");
                    format!("{} (at {})", e.message, path)
                }
                _ => e.message,
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow!("GraphQL {} error: {}", operation, msg));
    }
    parsed
        .data
        .ok_or_else(|| anyhow!("GraphQL {} returned no data", operation))
}

#[async_trait]
impl MovieApi for MoviesClient {
    async fn add_movie(&self, movie: NewMovie) -> Result<MovieRecord> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "addMovie")]
            add_movie: Option<MovieRecord>,
        }

        let query = format!(
            r#"mutation addMovie($title: String!, $description: String, $poster_image: String, $year: Int, $rating: Int) {{
  addMovie(title: $title, description: $description, poster_image: $poster_image, year: $year, rating: $rating) {{ {MOVIE_FIELDS} }}
}}
"#
        );
        let variables = serde_json::to_value(&movie).context("Failed to encode addMovie variables")?;
        let data: Data = self.execute("addMovie", &query, variables).await?;
        let created = data
            .add_movie
            .ok_or_else(|| anyhow!("addMovie returned no movie for '{}'", movie.title))?;
        info!("Created movie '{}' ({})", created.title, created.id);
        self.refresh_after_mutation("addMovie").await;
        Ok(created)
    }

    async fn update_movie(&self, movie: MovieUpdate) -> Result<MovieRecord> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "updateMovie")]
            update_movie: Option<MovieRecord>,
        }

        let query = format!(
            r#"mutation updateMovie($id: ID!, $title: String!, $description: String, $poster_image: String, $year: Int, $rating: Int) {{
  updateMovie(id: $id, title: $title, description: $description, poster_image: $poster_image, year: $year, rating: $rating) {{ {MOVIE_FIELDS} }}
}}
"#
        );
        let variables =
            serde_json::to_value(&movie).context("Failed to encode updateMovie variables")?;
        let data: Data = self.execute("updateMovie", &query, variables).await?;
        let updated = data
            .update_movie
            .ok_or_else(|| anyhow!("updateMovie returned no movie for id {}", movie.id))?;
        info!("Updated movie '{}' ({})", updated.title, updated.id);
        self.refresh_after_mutation("updateMovie").await;
        Ok(updated)
    }

    async fn fetch_movie(&self, id: &MovieId) -> Result<Option<MovieRecord>> {
        #[derive(Deserialize)]
        struct Data {
            movie: Option<MovieRecord>,
        }

        let query = format!("query movie($id: ID!) {{\n  movie(id: $id) {{ {MOVIE_FIELDS} }}\n}}\n");
        let data: Data = self
            .execute("movie", &query, json!({ "id": id.as_str() }))
            .await?;
        Ok(data.movie)
    }

    async fn all_movies(&self) -> Result<Vec<MovieRecord>> {
        if let Some(movies) = self.listing.read().await.as_ref() {
            return Ok(movies.clone());
        }
        self.refetch_all_movies().await
    }
}
