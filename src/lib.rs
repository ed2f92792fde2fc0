pub mod annotation;
pub mod error;
pub mod eval;
pub mod filter;
pub mod index;
pub mod model;
pub mod structure;

pub use annotation::{BinarySearchLookup, FixedKeysLongStorage, IndexLookup};
pub use error::EngineError;
pub use eval::{
    AssignmentOperation, ComparisonOp, DuplicationContext, EvaluationContext, Expression,
    LogicalOp, Matcher, Value, ValueType, VariableRef,
};
pub use filter::{
    ExpressionFilter, Filter, FilterContext, FilterError, FilterJob, FilterProcessor,
    FilterProcessorBuilder, FilterReport, KeyFilter, ProcessorState, ThreadVerifier,
};
pub use index::{HeapMerge, IndexRange};
pub use model::{AnnotationManifest, Container, Edge, Item, UNSET_LONG};
pub use structure::{EdgeStorage, StaticEdgeStorage, StaticEdgeStorageBuilder};
