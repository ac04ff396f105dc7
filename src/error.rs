use thiserror::Error;

/// Errors raised by operators: construction, configuration, source wiring
/// and tile computation.
#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
    #[error("Parameter injection failed: {0}")]
    ParameterInjection(String),
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
    #[error("Missing source product '{0}'")]
    MissingSourceProduct(String),
    #[error("Unknown source slot '{0}'")]
    UnknownSourceSlot(String),
    #[error("Tile index ({tile_x}, {tile_y}) out of image bounds")]
    TileOutOfBounds { tile_x: usize, tile_y: usize },
    #[error("Operator error: {0}")]
    Other(String),
}

impl OperatorError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while validating, initializing or executing a processing
/// graph. All of these are fatal to the current execution.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Empty graph: '{0}' has no nodes")]
    EmptyGraph(String),
    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),
    #[error("Missing source. Node id: {node_id}, source id: {source_id}")]
    MissingSource { node_id: String, source_id: String },
    #[error("Cyclic connection reaching node '{node_id}'")]
    CyclicGraph { node_id: String },
    #[error("Failed to initialize node '{node_id}': {source}")]
    OperatorInitFailed {
        node_id: String,
        #[source]
        source: OperatorError,
    },
    #[error("Tile computation failed on node '{node_id}', band '{band}': {source}")]
    TileComputationFailed {
        node_id: String,
        band: String,
        #[source]
        source: OperatorError,
    },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub fn missing_source(node_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self::MissingSource {
            node_id: node_id.into(),
            source_id: source_id.into(),
        }
    }

    pub fn init_failed(node_id: impl Into<String>, source: OperatorError) -> Self {
        Self::OperatorInitFailed {
            node_id: node_id.into(),
            source,
        }
    }
}
