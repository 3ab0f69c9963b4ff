use std::sync::Arc;

use blockshot_core::{
    dedupe, pack, Batch, BatchResult, ReportData, ResourceErrorEntry, ResourceFilter,
    ResourceRef, ResourceStat, RunError, RunMode, RunReport, SkipClassSet, TextFragment,
};
use blockshot_logging::{blockshot_debug, blockshot_info, blockshot_warn};
use futures_util::{future, stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::{ConverterClient, ReqwestConverterClient};
use crate::config::RunConfig;
use crate::extract::{BlockExtractor, LeafBlockExtractor};
use crate::store::ResourceStore;

/// Drives one resolve -> extract -> dedupe -> pack -> dispatch pass per call.
///
/// Runs share nothing mutable; one orchestrator can serve concurrent runs.
pub struct Orchestrator {
    store: Arc<dyn ResourceStore>,
    client: Arc<dyn ConverterClient>,
    extractor: Arc<dyn BlockExtractor>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ResourceStore>, config: RunConfig) -> Self {
        let client = Arc::new(ReqwestConverterClient::new(config.converter_settings()));
        Self {
            store,
            client,
            extractor: Arc::new(LeafBlockExtractor),
            config,
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ConverterClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn BlockExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn run(&self, mode: &str, resource_ids_csv: &str, skip_classes_csv: &str) -> RunReport {
        self.run_with_cancel(mode, resource_ids_csv, skip_classes_csv, &CancellationToken::new())
            .await
    }

    /// Like [`Orchestrator::run`], but stops dispatching new batches once
    /// `cancel` fires. Batches already sent keep their results in the report.
    pub async fn run_with_cancel(
        &self,
        mode: &str,
        resource_ids_csv: &str,
        skip_classes_csv: &str,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut data = ReportData::default();
        let report = match self
            .execute(mode, resource_ids_csv, skip_classes_csv, cancel, &mut data)
            .await
        {
            Ok(()) => RunReport::dispatched(data),
            Err(err) => {
                blockshot_warn!("Run aborted: {}", err);
                RunReport::aborted(&err, data)
            }
        };
        blockshot_info!("Run finished with {}: {}", report.http_code, report.message);
        report
    }

    async fn execute(
        &self,
        mode: &str,
        resource_ids_csv: &str,
        skip_classes_csv: &str,
        cancel: &CancellationToken,
        data: &mut ReportData,
    ) -> Result<(), RunError> {
        self.config.validate()?;
        data.batch_max_bytes = self.config.batch_max_bytes();
        data.batch_max_blocks = self.config.batch_max_blocks();

        let mode: RunMode = mode.parse()?;
        data.mode = Some(mode);
        let filter = ResourceFilter::from_request(mode, resource_ids_csv)?;
        data.requested_ids = filter.requested_ids().to_vec();

        let resources = self
            .store
            .list_resources(&filter)
            .map_err(|err| RunError::Store(err.to_string()))?;
        if resources.is_empty() {
            return Err(RunError::NotFound {
                mode: mode.to_string(),
            });
        }
        data.resources_scanned = resources.len();
        blockshot_info!("Resolved {} resources for mode {}", resources.len(), mode);

        let skip_classes = self.config.skip_classes(skip_classes_csv);
        let fragments = self.extract_all(&resources, &skip_classes, data);
        data.blocks_extracted = fragments.len();

        let unique = dedupe(fragments);
        data.blocks_total = unique.len();
        if unique.is_empty() {
            return Err(RunError::ExtractionEmpty {
                rendered: data.resources.len(),
            });
        }

        let batches = pack(unique, data.batch_max_bytes, data.batch_max_blocks);
        data.batches_total = batches.len();
        blockshot_info!(
            "Packed {} unique blocks ({} extracted) into {} batches",
            data.blocks_total,
            data.blocks_extracted,
            batches.len()
        );

        data.batches = self.dispatch(&batches, cancel).await;
        data.cancelled = data.batches.len() < batches.len();
        Ok(())
    }

    fn extract_all(
        &self,
        resources: &[ResourceRef],
        skip_classes: &SkipClassSet,
        data: &mut ReportData,
    ) -> Vec<TextFragment> {
        let mut fragments = Vec::new();
        for resource in resources {
            match self.store.render_to_html(resource) {
                Ok(html) => {
                    let blocks = self.extractor.extract(&html, skip_classes);
                    blockshot_debug!(
                        "Resource {} ({}) yielded {} blocks",
                        resource.id,
                        resource.title,
                        blocks.len()
                    );
                    data.resources.push(ResourceStat {
                        id: resource.id,
                        title: resource.title.clone(),
                        blocks: blocks.len(),
                    });
                    fragments.extend(blocks);
                }
                Err(err) => {
                    blockshot_warn!("Resource {} failed to render: {}", resource.id, err);
                    data.resource_errors.push(ResourceErrorEntry {
                        id: resource.id,
                        title: resource.title.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        fragments
    }

    async fn dispatch(&self, batches: &[Batch], cancel: &CancellationToken) -> Vec<BatchResult> {
        let total = batches.len();
        let client = self.client.as_ref();

        // `buffered` yields in input order regardless of completion order.
        stream::iter(batches.iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|(position, batch)| async move {
                let result = client.send(batch, position + 1, total).await;
                if result.success {
                    blockshot_debug!("Batch {}/{} converted", result.batch, total);
                } else {
                    blockshot_warn!(
                        "Batch {}/{} failed (http {}): {}",
                        result.batch,
                        total,
                        result.http_code,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                result
            })
            .buffered(self.config.dispatch_concurrency())
            .collect()
            .await
    }
}
