pub mod tree;
pub mod builders;
pub mod ramped;
pub mod chromosome;
pub mod codon_reader;
pub mod mapper;
pub mod operators;

pub use tree::{DerivationTree, TreeIndividual, TreePath};
pub use builders::{DerivationBuilder, FullBuilder, GrowBuilder};
pub use ramped::{RampedHalfAndHalf, DEFAULT_MAX_RETRIES};
pub use chromosome::{Chromosome, OverflowPolicy};
pub use codon_reader::CodonReader;
pub use mapper::{InvalidReason, MappedIndividual, Mapper, Validity};
pub use operators::{one_point_crossover, point_mutation, random_chromosome};
