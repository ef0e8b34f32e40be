use gpu::RenderError;
use layers::IncidentError;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Render(RenderError),
    Incidents(IncidentError),
    Config(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Render(e) => write!(f, "{e}"),
            EngineError::Incidents(e) => write!(f, "invalid incidents: {e}"),
            EngineError::Config(msg) => write!(f, "invalid engine config: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Render(e) => Some(e),
            EngineError::Incidents(e) => Some(e),
            EngineError::Config(_) => None,
        }
    }
}

impl From<RenderError> for EngineError {
    fn from(e: RenderError) -> Self {
        EngineError::Render(e)
    }
}

impl From<IncidentError> for EngineError {
    fn from(e: IncidentError) -> Self {
        EngineError::Incidents(e)
    }
}
