/*!
 * GC Module
 * Weak-finalization registry bridging the host collector to native cleanup
 */

pub mod finalizer;

pub use finalizer::FinalizerRegistry;
