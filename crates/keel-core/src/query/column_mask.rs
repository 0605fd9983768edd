/// A set of column numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMask {
    words: Vec<u64>,
}

impl ColumnMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(column_number: usize) -> Self {
        let mut mask = Self::new();
        mask.insert(column_number);
        mask
    }

    pub fn insert(&mut self, column_number: usize) {
        let (word, bit) = (column_number / 64, column_number % 64);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    pub fn contains(&self, column_number: usize) -> bool {
        let (word, bit) = (column_number / 64, column_number % 64);
        self.words
            .get(word)
            .is_some_and(|word| word & (1 << bit) != 0)
    }

    pub fn union_with(&mut self, other: &ColumnMask) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word |= other;
        }
    }

    /// True if every column of `self` is in `other`.
    pub fn is_subset_of(&self, other: &ColumnMask) -> bool {
        self.words.iter().enumerate().all(|(i, word)| {
            let other = other.words.get(i).copied().unwrap_or(0);
            word & other == *word
        })
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| i * 64 + bit)
        })
    }
}

impl FromIterator<usize> for ColumnMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = Self::new();
        for column_number in iter {
            mask.insert(column_number);
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_across_words() {
        let small: ColumnMask = [1, 70].into_iter().collect();
        let large: ColumnMask = [1, 5, 70].into_iter().collect();

        assert!(small.is_subset_of(&large));
        assert!(!large.is_subset_of(&small));
        assert!(ColumnMask::new().is_subset_of(&small));
        assert_eq!(large.iter().collect::<Vec<_>>(), [1, 5, 70]);
    }

    #[test]
    fn union_grows() {
        let mut mask = ColumnMask::single(2);
        mask.union_with(&ColumnMask::single(130));
        assert!(mask.contains(2));
        assert!(mask.contains(130));
        assert!(!mask.contains(3));
    }
}
