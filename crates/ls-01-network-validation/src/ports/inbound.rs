//! # Inbound Ports
//!
//! API this subsystem exposes to the query client.

use crate::domain::{QueryInput, ValidationError, ValidationReport};
use crate::ports::outbound::QueryResponseStreams;
use async_trait::async_trait;

/// Network validation API - inbound port.
#[async_trait]
pub trait NetworkValidationApi: Send + Sync {
    /// Confirms an HTTP query response against what the storage network
    /// reports over the system message bus.
    ///
    /// Resolves with a report once every expected node has answered, all
    /// owed propagations were observed, nodes agree on every hash and every
    /// payload message is attested. Fails with
    /// [`ValidationError::Timeout`] when that does not happen in time.
    async fn validate(
        &self,
        query_input: QueryInput,
        query_url: &str,
        response: QueryResponseStreams,
    ) -> Result<ValidationReport, ValidationError>;
}
