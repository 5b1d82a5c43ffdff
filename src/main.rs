/*!
 * Allocator Simulation - Main Entry Point
 *
 * Drives a viewer-style workload against the allocator:
 * - texture and buffer churn through the size-class pools
 * - imaging volumes cached per study and evicted under pressure
 * - a background compression pass through the transform collaborator
 * - discarding a whole study
 *
 * Environment variables:
 * - ALLOC_CONFIG: path to a JSON AllocatorConfig (default: built-in defaults)
 */

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use miette::IntoDiagnostic;
use std::time::Duration;
use tracing::{info, warn};

use tiered_alloc::memory::{GarbageCollector, MemoryInfo, TransformOutcome};
use tiered_alloc::{
    init_tracing, AllocatorConfig, Category, ClinicalPriority, MedicalContext, Priority,
    SharedBlockManager, TransformError, TransformOp, Transformer,
};

const MIB: usize = 1024 * 1024;

/// Stand-in codec: keeps every `level + 1`th byte on compress, repeats bytes
/// on decompress. Only the output length matters to the allocator.
struct SamplingCodec;

impl Transformer for SamplingCodec {
    fn transform(
        &self,
        op: TransformOp,
        input: Bytes,
    ) -> BoxFuture<'static, Result<Vec<u8>, TransformError>> {
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            match op {
                TransformOp::Compress { level } => {
                    let step = usize::from(level.max(1)) + 1;
                    Ok(input.iter().step_by(step).copied().collect())
                }
                TransformOp::Decompress => {
                    Ok(input.iter().flat_map(|&b| [b, b]).collect())
                }
            }
        }
        .boxed()
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let config = match std::env::var("ALLOC_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading allocator configuration");
            AllocatorConfig::load(&path)?
        }
        Err(_) => AllocatorConfig::default().with_profiling(true),
    };

    let allocator = SharedBlockManager::from_config(config)?;
    info!("Allocator simulation starting...");

    // Textures and vertex buffers: short-lived, pool-friendly sizes
    allocator.with(|mgr| {
        for round in 0..4 {
            let ids: Vec<_> = (0..16)
                .filter_map(|i| {
                    let size = (i + 1) * 48 * 1024;
                    let category = if i % 2 == 0 { Category::Texture } else { Category::Buffer };
                    mgr.allocate(size, category, Priority::Medium, None).ok()
                })
                .collect();
            for id in ids {
                mgr.release(id);
            }
            info!(round, "Texture churn round complete");
        }
    });

    // Imaging volumes: kept as evictable cache entries once viewed
    let mut volumes = Vec::new();
    for (study, priority) in [
        ("1.2.840.1", Priority::Low),
        ("1.2.840.2", Priority::High),
        ("1.2.840.3", Priority::Medium),
    ] {
        for series in 0..4 {
            let context = MedicalContext::new(study)
                .with_series(format!("{study}.{series}"))
                .with_clinical_priority(ClinicalPriority::Routine);
            let result = allocator.with(|mgr| {
                mgr.allocate(24 * MIB, Category::MedicalData, priority, Some(context))
            });
            match result {
                Ok(id) => {
                    allocator.with(|mgr| mgr.unpin(id));
                    volumes.push(id);
                }
                Err(e) => warn!(study, series, error = %e, "Volume allocation failed"),
            }
        }
    }

    // Large scratch buffers force eviction of cached volumes
    allocator.with(|mgr| {
        let scratch: Vec<_> = (0..6)
            .filter_map(|_| mgr.allocate(40 * MIB, Category::Geometry, Priority::Critical, None).ok())
            .collect();
        info!(
            allocated = scratch.len(),
            gc_runs = mgr.gc_runs(),
            should_collect = mgr.should_collect(),
            "Scratch buffers allocated"
        );
    });

    // Compress surviving volumes while other work continues
    let codec = SamplingCodec;
    let survivors: Vec<_> = allocator.with(|mgr| {
        volumes
            .iter()
            .copied()
            .filter(|&id| mgr.peek(id).is_some())
            .collect()
    });
    let outcomes: Vec<Result<TransformOutcome, TransformError>> = futures::future::join_all(
        survivors
            .iter()
            .map(|&id| allocator.apply_transform(id, TransformOp::Compress { level: 3 }, &codec)),
    )
    .await;
    let reclaimed: i64 = outcomes.iter().flatten().map(TransformOutcome::delta).sum();
    info!(volumes = survivors.len(), reclaimed, "Compression pass complete");

    // Discard a study outright
    let freed = allocator.with(|mgr| mgr.release_by_context("1.2.840.2"));
    info!(freed, "Study 1.2.840.2 discarded");

    let (stats, pressure) = allocator.with(|mgr| {
        mgr.defragment();
        mgr.collect();
        (mgr.stats(), mgr.pressure())
    });
    info!(
        pressure = %pressure,
        fragmentation = stats.fragmentation_ratio,
        pool_hit_ratio = stats.pool_hit_ratio,
        "Simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);

    allocator.with(|mgr| mgr.dispose());
    Ok(())
}
