use crate::engines::generation::chromosome::{Chromosome, OverflowPolicy};
use crate::error::Result;
use crate::types::Codon;
use rand::Rng;

/// Generate a random chromosome with codons drawn from `0..=max_codon`
pub fn random_chromosome<R: Rng + ?Sized>(
    length: usize,
    max_codon: Codon,
    policy: OverflowPolicy,
    rng: &mut R,
) -> Result<Chromosome> {
    let codons = (0..length).map(|_| rng.gen_range(0..=max_codon)).collect();
    Chromosome::new(codons, policy)
}

/// Point mutation: each codon is redrawn with probability `mutation_rate`
pub fn point_mutation<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    mutation_rate: f64,
    max_codon: Codon,
    rng: &mut R,
) {
    for codon in chromosome.codons.iter_mut() {
        if rng.gen::<f64>() < mutation_rate {
            *codon = rng.gen_range(0..=max_codon);
        }
    }
}

/// Variable-length one-point crossover: each parent gets its own cut point
/// and the children swap tails. Parents shorter than two codons are copied.
pub fn one_point_crossover<R: Rng + ?Sized>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    if parent1.len() < 2 || parent2.len() < 2 {
        return (parent1.clone(), parent2.clone());
    }

    let cut1 = rng.gen_range(1..parent1.len());
    let cut2 = rng.gen_range(1..parent2.len());

    let mut head1 = parent1.codons[..cut1].to_vec();
    head1.extend_from_slice(&parent2.codons[cut2..]);
    let mut head2 = parent2.codons[..cut2].to_vec();
    head2.extend_from_slice(&parent1.codons[cut1..]);

    // Both children keep a non-empty head, so the wrapping invariant holds.
    (
        Chromosome {
            codons: head1,
            policy: parent1.policy,
        },
        Chromosome {
            codons: head2,
            policy: parent2.policy,
        },
    )
}
