use tokio::sync::RwLock;

use crate::models::GraphStats;
use crate::services::graph::MovieGraph;

/// Token issued when a build starts, required to publish its result.
///
/// The ticket pins the epoch the build was requested in; a newer build request
/// or a reset bumps the epoch, so a stale build completes its computation but
/// cannot become current (last-request-wins).
#[derive(Debug)]
pub struct BuildTicket {
    epoch: u64,
}

/// Owns the single current graph for the process.
///
/// All mutation and publication flows through this type: builds publish
/// atomically through epoch-checked tickets, personalization runs under the
/// write lock, and queries share the read lock against a stable graph. A
/// reader never observes a half-built or half-personalized graph.
pub struct GraphLifecycle {
    inner: RwLock<LifecycleState>,
}

struct LifecycleState {
    graph: MovieGraph,
    epoch: u64,
    next_version: u64,
}

impl Default for GraphLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphLifecycle {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LifecycleState {
                graph: MovieGraph::empty(),
                epoch: 0,
                next_version: 1,
            }),
        }
    }

    /// Registers a new build request and returns its ticket.
    ///
    /// Any build in flight under an older ticket is implicitly superseded.
    pub async fn begin_build(&self) -> BuildTicket {
        let mut state = self.inner.write().await;
        state.epoch += 1;
        tracing::debug!(epoch = state.epoch, "Build started");
        BuildTicket { epoch: state.epoch }
    }

    /// Atomically replaces the current graph with a finished build.
    ///
    /// Returns false (and drops the graph) when the ticket is stale because a
    /// newer build or a reset intervened.
    pub async fn publish(&self, ticket: BuildTicket, mut graph: MovieGraph) -> bool {
        let mut state = self.inner.write().await;
        if ticket.epoch != state.epoch {
            tracing::info!(
                ticket_epoch = ticket.epoch,
                current_epoch = state.epoch,
                "Discarding stale build result"
            );
            return false;
        }

        graph.set_version(state.next_version);
        state.next_version += 1;
        tracing::info!(
            version = graph.version(),
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "Graph published"
        );
        state.graph = graph;
        true
    }

    /// Discards the current graph and all personalization, and invalidates any
    /// in-flight build so it cannot resurrect the old state.
    pub async fn reset(&self) {
        let mut state = self.inner.write().await;
        state.epoch += 1;
        state.graph = MovieGraph::empty();
        tracing::info!(epoch = state.epoch, "Graph reset");
    }

    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.graph.is_ready()
    }

    /// Stats for the current graph; the defined empty value before any build
    pub async fn stats(&self) -> GraphStats {
        self.inner.read().await.graph.stats()
    }

    /// Runs a read-only query against the current graph
    pub async fn with_current<T>(&self, f: impl FnOnce(&MovieGraph) -> T) -> T {
        let state = self.inner.read().await;
        f(&state.graph)
    }

    /// Runs one mutation (a personalization pass) against the current graph.
    ///
    /// The write lock gives single-writer discipline: the mutation cannot
    /// interleave with a publication or another mutation.
    pub async fn with_current_mut<T>(&self, f: impl FnOnce(&mut MovieGraph) -> T) -> T {
        let mut state = self.inner.write().await;
        f(&mut state.graph)
    }
}
