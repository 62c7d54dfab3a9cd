//! Background nucleotide distribution used for PWM generation.

use crate::constants::MIN_BKG_VALUE;
use crate::types::{Result, SweepError, Verbosity};

/// Background probabilities for A, C, G, T/U.
///
/// Values are floored at [`MIN_BKG_VALUE`] and renormalized so the exact
/// score distribution stays within its size ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background(pub [f64; 4]);

impl Default for Background {
    fn default() -> Self {
        Self::uniform()
    }
}

impl Background {
    /// The uniform distribution assumed when nothing else is supplied.
    #[must_use]
    pub const fn uniform() -> Self {
        Self([0.25; 4])
    }

    /// Probability of the base with index `i` (A=0, C=1, G=2, T=3).
    #[inline]
    #[must_use]
    pub fn prob(&self, i: usize) -> f64 {
        self.0[i]
    }

    /// Validate four raw probabilities, applying the floor and
    /// renormalizing. Warnings for adjusted values go to stderr when
    /// verbose.
    pub fn from_values(mut probs: [f64; 4], verbosity: Verbosity) -> Result<Self> {
        if probs.iter().any(|p| *p < 0.0 || !p.is_finite()) {
            return Err(SweepError::Config(
                "background values must be non-negative and finite".into(),
            ));
        }
        let min = probs.iter().cloned().fold(f64::INFINITY, f64::min);
        if min < MIN_BKG_VALUE {
            if verbosity.verbose() {
                eprintln!(
                    "Warning: Detected background values smaller than allowed min, \
                     adjusting ({min:.2}<{MIN_BKG_VALUE:.2})."
                );
            }
            for p in &mut probs {
                *p += MIN_BKG_VALUE;
            }
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > 0.001 && verbosity.verbose() {
            eprintln!("Warning: Background values don't add up to 1.0, adjusting (sum={sum:.3}).");
        }
        for p in &mut probs {
            *p /= sum;
        }
        Ok(Self(probs))
    }

    /// Parse a user-supplied `A,C,G,T` probability list such as
    /// `0.3,0.2,0.2,0.3`. Whitespace around values is ignored.
    pub fn parse_user(input: &str, verbosity: Verbosity) -> Result<Self> {
        let fields: Vec<&str> = input.split(',').map(str::trim).collect();
        if fields.len() > 4 {
            return Err(SweepError::Config(
                "too many background values provided (need 4)".into(),
            ));
        }
        if fields.len() < 4 {
            return Err(SweepError::Config(
                "too few background values found (need 4)".into(),
            ));
        }
        let mut probs = [0.0; 4];
        for (i, field) in fields.iter().enumerate() {
            probs[i] = field.parse::<f64>().map_err(|_| {
                SweepError::Config(format!(
                    "failed to parse background value (input: {input}, bad value: {field})"
                ))
            })?;
        }
        Self::from_values(probs, verbosity)
    }

    /// Parse the value line below a MEME `Background letter frequencies`
    /// header, e.g. `A 0.303 C 0.183 G 0.209 T 0.306`.
    pub fn parse_meme_line(line: &str, line_num: u64, verbosity: Verbosity) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 8 {
            return Err(SweepError::Parse(format!(
                "malformed MEME background line (L{line_num}): expected 8 fields, found {}",
                tokens.len()
            )));
        }
        let expected: [&[u8]; 4] = [b"A", b"C", b"G", b"TU"];
        let mut probs = [0.0; 4];
        for i in 0..4 {
            let letter = tokens[i * 2].as_bytes();
            if letter.len() != 1 || !expected[i].contains(&letter[0]) {
                return Err(SweepError::Parse(format!(
                    "unexpected letter '{}' in MEME background (L{line_num})",
                    tokens[i * 2]
                )));
            }
            probs[i] = tokens[i * 2 + 1].parse::<f64>().map_err(|_| {
                SweepError::Parse(format!(
                    "failed to parse MEME background value '{}' (L{line_num})",
                    tokens[i * 2 + 1]
                ))
            })?;
        }
        Self::from_values(probs, verbosity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_default() {
        assert_eq!(Background::default(), Background([0.25; 4]));
    }

    #[test]
    fn parse_user_accepts_spaces() {
        let bkg = Background::parse_user("0.3, 0.2, 0.2, 0.3", Verbosity::Quiet).unwrap();
        let sum: f64 = bkg.0.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((bkg.prob(0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn parse_user_rejects_wrong_count() {
        assert!(Background::parse_user("0.5,0.5", Verbosity::Quiet).is_err());
        assert!(Background::parse_user("0.2,0.2,0.2,0.2,0.2", Verbosity::Quiet).is_err());
    }

    #[test]
    fn parse_user_rejects_garbage() {
        assert!(Background::parse_user("0.25,x,0.25,0.25", Verbosity::Quiet).is_err());
    }

    #[test]
    fn small_values_get_floored_and_renormalized() {
        let bkg = Background::from_values([0.0, 0.0, 0.5, 0.5], Verbosity::Quiet).unwrap();
        for i in 0..4 {
            assert!(bkg.prob(i) >= MIN_BKG_VALUE * 0.9);
        }
        let sum: f64 = bkg.0.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unnormalized_values_are_rescaled() {
        let bkg = Background::from_values([2.0, 2.0, 2.0, 2.0], Verbosity::Quiet).unwrap();
        assert_eq!(bkg, Background([0.25; 4]));
    }

    #[test]
    fn meme_line_parses_in_order() {
        let bkg =
            Background::parse_meme_line("A 0.303 C 0.183 G 0.209 T 0.305", 5, Verbosity::Quiet)
                .unwrap();
        assert!((bkg.prob(1) - 0.183).abs() < 1e-3);
    }

    #[test]
    fn meme_line_accepts_u_for_t() {
        assert!(
            Background::parse_meme_line("A 0.25 C 0.25 G 0.25 U 0.25", 1, Verbosity::Quiet).is_ok()
        );
    }

    #[test]
    fn meme_line_rejects_out_of_order_letters() {
        assert!(
            Background::parse_meme_line("C 0.25 A 0.25 G 0.25 T 0.25", 1, Verbosity::Quiet)
                .is_err()
        );
    }
}
