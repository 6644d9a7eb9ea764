/// Fault behavior layered in front of the completion handler for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    Passthrough,
    RandomSleep,
    RandomFail,
    RandomAll,
}

/// Static route table, built once at startup and shared by every connection.
pub struct Router {
    routes: Vec<(&'static str, FaultPolicy)>,
}

impl Router {
    pub fn new() -> Self {
        Router {
            routes: vec![
                ("/v1/chat/completions", FaultPolicy::Passthrough),
                ("/rand_sleep/v1/chat/completions", FaultPolicy::RandomSleep),
                ("/rand_fail/v1/chat/completions", FaultPolicy::RandomFail),
                ("/rand_all/v1/chat/completions", FaultPolicy::RandomAll),
            ],
        }
    }

    pub fn resolve(&self, path: &str) -> Option<FaultPolicy> {
        self.routes
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, policy)| *policy)
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}
