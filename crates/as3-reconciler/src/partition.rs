//! Out-of-band partition removal

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::declaration::Assembler;
use crate::submitter::{PostEvent, PostResponse, Submitter};

/// Posts deletion-stub declarations outside the reconciliation cycle
#[derive(Clone)]
pub struct PartitionDeleter {
    assembler: Assembler,
    submitter: Arc<dyn Submitter>,
}

impl PartitionDeleter {
    pub fn new(assembler: Assembler, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            assembler,
            submitter,
        }
    }

    /// Remove a single partition from the appliance.
    pub async fn delete_partition(&self, partition: &str) -> PostResponse {
        self.delete_partitions(&[partition.to_string()]).await
    }

    /// Remove several partitions with one declaration.
    #[instrument(skip(self))]
    pub async fn delete_partitions(&self, partitions: &[String]) -> PostResponse {
        let declaration = match self.assembler.deletion_declaration(partitions) {
            Ok(declaration) => declaration,
            Err(e) => {
                error!(error = %e, "Failed to build deletion declaration");
                return PostResponse::rejected(PostEvent::Error);
            }
        };

        let response = self
            .submitter
            .post_config(declaration.serialized(), None)
            .await;
        if response.accepted {
            info!("Partitions deleted");
        } else {
            error!(event = %response.event, "Partition deletion rejected");
        }
        response
    }
}
