use crate::engines::generation::chromosome::Chromosome;
use crate::types::Codon;
use rand::Rng;

/// Sequentially consumes codons from a chromosome
pub struct CodonReader<'a, R: Rng + ?Sized> {
    chromosome: &'a mut Chromosome,
    rng: &'a mut R,
    position: usize,
}

impl<'a, R: Rng + ?Sized> CodonReader<'a, R> {
    pub fn new(chromosome: &'a mut Chromosome, rng: &'a mut R) -> Self {
        Self {
            chromosome,
            rng,
            position: 0,
        }
    }

    /// Consume the next codon, or `None` once an exhausting chromosome runs out
    pub fn consume(&mut self) -> Option<Codon> {
        let codon = self.chromosome.read(self.position, &mut *self.rng)?;
        self.position += 1;
        Some(codon)
    }

    /// Consume a codon and map it to a choice index
    pub fn choose(&mut self, num_choices: usize) -> Option<usize> {
        if num_choices == 0 {
            return None;
        }
        self.consume().map(|codon| codon as usize % num_choices)
    }

    /// Check whether another codon can be read
    pub fn has_codons(&self) -> bool {
        !self.chromosome.is_exhausted_at(self.position)
    }

    /// Number of codons consumed so far
    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::chromosome::OverflowPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_choose_uses_modulo() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut chromosome = Chromosome::new(vec![7, 2, 9], OverflowPolicy::Exhaust).unwrap();
        let mut reader = CodonReader::new(&mut chromosome, &mut rng);
        assert_eq!(reader.choose(3), Some(1));
        assert_eq!(reader.choose(5), Some(2));
        assert_eq!(reader.choose(0), None);
        assert_eq!(reader.position(), 2);
        assert!(reader.has_codons());
        assert_eq!(reader.choose(4), Some(1));
        assert!(!reader.has_codons());
        assert_eq!(reader.consume(), None);
        assert_eq!(reader.position(), 3);
    }
}
