/*!
 * Monitoring Module
 * Tracing bootstrap
 */

mod tracer;

pub use tracer::init_tracing;
