use crate::common::{Error, Result};

/// First position where two results differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub left: i32,
    pub right: i32,
}

/// Outcome of comparing two result arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    mismatch: Option<Mismatch>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.mismatch.is_none()
    }

    pub fn mismatch(&self) -> Option<Mismatch> {
        self.mismatch
    }

    pub fn mismatch_index(&self) -> Option<usize> {
        self.mismatch.map(|m| m.index)
    }
}

/// Compares element-wise and stops at the first difference.
///
/// Arrays of different length are a caller error, not a mismatch.
pub fn compare(a: &[i32], b: &[i32]) -> Result<ValidationResult> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mismatch = a
        .iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .map(|index| Mismatch {
            index,
            left: a[index],
            right: b[index],
        });

    Ok(ValidationResult { mismatch })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_arrays_pass() {
        let a = [0, 1, 1, 0, 1];
        let result = compare(&a, &a).unwrap();

        assert!(result.passed());
        assert_eq!(result.mismatch_index(), None);
    }

    #[test]
    fn empty_arrays_pass() {
        assert!(compare(&[], &[]).unwrap().passed());
    }

    #[test]
    fn reports_lowest_differing_index() {
        let a = [0, 1, 1, 0, 1, 0];
        let b = [0, 1, 0, 0, 0, 1];
        let result = compare(&a, &b).unwrap();

        assert!(!result.passed());
        assert_eq!(
            result.mismatch(),
            Some(Mismatch {
                index: 2,
                left: 1,
                right: 0
            })
        );
    }

    #[test]
    fn difference_at_last_index() {
        let a = vec![1; 1000];
        let mut b = a.clone();
        b[999] = 0;

        assert_eq!(compare(&a, &b).unwrap().mismatch_index(), Some(999));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = compare(&[1, 2, 3], &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { left: 3, right: 2 }));
    }
}
