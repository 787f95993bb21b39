//! Fire-and-forget delivery of form mutations.
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::graphql::MovieApi;
use crate::models::{MovieUpdate, NewMovie};

/// Invokes the create/update operations without waiting for them.
pub trait MovieDispatch: Send + Sync {
    fn add_movie(&self, movie: NewMovie);
    fn update_movie(&self, movie: MovieUpdate);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add(NewMovie),
    Update(MovieUpdate),
}

/// Queues mutations for a background worker that runs them against a
/// [`MovieApi`]. Failures are logged and dropped.
#[derive(Clone)]
pub struct MutationQueue {
    tx: mpsc::UnboundedSender<Mutation>,
}

impl MutationQueue {
    /// Spawns the worker. It exits once every queue handle is dropped.
    pub fn spawn(api: Arc<dyn MovieApi>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Mutation>();
        let worker = tokio::spawn(async move {
            while let Some(mutation) = rx.recv().await {
                run_mutation(api.as_ref(), mutation).await;
            }
            debug!("Mutation queue closed");
        });
        (Self { tx }, worker)
    }

    fn push(&self, mutation: Mutation) {
        if self.tx.send(mutation).is_err() {
            error!("Mutation worker is gone; dropping mutation");
        }
    }
}

async fn run_mutation(api: &dyn MovieApi, mutation: Mutation) {
    match mutation {
        Mutation::Add(movie) => {
            let title = movie.title.clone();
            match api.add_movie(movie).await {
                Ok(created) => info!("addMovie completed for '{}' ({})", title, created.id),
                Err(e) => error!("addMovie failed for '{}': {:#}", title, e),
            }
        }
        Mutation::Update(movie) => {
            let id = movie.id.clone();
            match api.update_movie(movie).await {
                Ok(_) => info!("updateMovie completed for {}", id),
                Err(e) => error!("updateMovie failed for {}: {:#}", id, e),
            }
        }
    }
}

impl MovieDispatch for MutationQueue {
    fn add_movie(&self, movie: NewMovie) {
        debug!("Queueing addMovie for '{}'", movie.title);
        self.push(Mutation::Add(movie));
    }

    fn update_movie(&self, movie: MovieUpdate) {
        debug!("Queueing updateMovie for {}", movie.id);
        self.push(Mutation::Update(movie));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieId, MovieRecord};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Mutation>>,
        fail_adds: bool,
    }

    fn stored(id: &str, title: &str) -> MovieRecord {
        MovieRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            poster_image_url: String::new(),
            year: None,
            rating: None,
        }
    }

    #[async_trait]
    impl MovieApi for RecordingApi {
        async fn add_movie(&self, movie: NewMovie) -> Result<MovieRecord> {
            self.calls.lock().unwrap().push(Mutation::Add(movie.clone()));
            if self.fail_adds {
                return Err(anyhow!("backend down"));
            }
            Ok(stored("1", &movie.title))
        }

        async fn update_movie(&self, movie: MovieUpdate) -> Result<MovieRecord> {
            self.calls.lock().unwrap().push(Mutation::Update(movie.clone()));
            Ok(stored(movie.id.as_str(), &movie.title))
        }

        async fn fetch_movie(&self, _id: &MovieId) -> Result<Option<MovieRecord>> {
            Ok(None)
        }

        async fn all_movies(&self) -> Result<Vec<MovieRecord>> {
            Ok(Vec::new())
        }
    }

    fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            description: String::new(),
            poster_image_url: String::new(),
            year: None,
            rating: None,
        }
    }

    #[tokio::test]
    async fn worker_runs_queued_mutations_in_order() {
        let api = Arc::new(RecordingApi::default());
        let (queue, worker) = MutationQueue::spawn(api.clone());
        let update = MovieUpdate {
            id: MovieId::parse("42").unwrap(),
            title: "New".to_string(),
            description: "d".to_string(),
            poster_image_url: String::new(),
            year: Some(2000),
            rating: Some(5),
        };
        queue.add_movie(new_movie("First"));
        queue.update_movie(update.clone());
        drop(queue);
        worker.await.expect("worker join");

        let calls = api.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![Mutation::Add(new_movie("First")), Mutation::Update(update)]
        );
    }

    #[tokio::test]
    async fn worker_survives_failed_mutations() {
        let api = Arc::new(RecordingApi {
            fail_adds: true,
            ..Default::default()
        });
        let (queue, worker) = MutationQueue::spawn(api.clone());
        queue.add_movie(new_movie("One"));
        queue.add_movie(new_movie("Two"));
        drop(queue);
        worker.await.expect("worker join");
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }
}
