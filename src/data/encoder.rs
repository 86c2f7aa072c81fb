//! Sequence/ratio encoding
//!
//! Turns a base window plus per-position conversion ratios into the fixed-size
//! numeric matrix the model consumes. Encoding is pure and deterministic; the
//! only rejection (ambiguous bases) happens upstream in the table parser.

use crate::data::{CpgRecord, MATRIX_ROWS, NUM_BASES, WINDOW_LEN};

/// Row index for a nucleotide: A=0, C=1, G=2, T=3
pub fn base_row(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Reverse a sequence and complement it (A↔T, C↔G, case preserved, N/n fixed)
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'C' => 'G',
            'G' => 'C',
            'T' => 'A',
            'a' => 't',
            'c' => 'g',
            'g' => 'c',
            't' => 'a',
            other => other,
        })
        .collect()
}

/// Encode one strand into a 4×len matrix, row-major
///
/// Cell (base, position) holds the ratio at that position when the window base
/// matches the row's nucleotide, else 0. A base outside ACGT contributes to no
/// row, leaving its column all zero.
pub fn encode_strand(seq: &str, ratios: &[f32]) -> Vec<f32> {
    debug_assert_eq!(seq.len(), ratios.len());
    let len = seq.len();
    let mut matrix = vec![0.0f32; NUM_BASES * len];
    for (col, base) in seq.bytes().enumerate() {
        if let Some(row) = base_row(base) {
            matrix[row * len + col] = ratios[col];
        }
    }
    matrix
}

/// Encode a site into the 8×11 sample matrix, row-major
///
/// The Watson 4×11 block is stacked above the Crick block.
pub fn encode_site(record: &CpgRecord) -> Vec<f32> {
    let mut matrix = Vec::with_capacity(MATRIX_ROWS * WINDOW_LEN);
    matrix.extend(encode_strand(&record.watson_seq, &record.watson_ratios));
    matrix.extend(encode_strand(&record.crick_seq, &record.crick_ratios));
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Label;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ACGT"), "ACGT");
        assert_eq!(reverse_complement("AACG"), "CGTT");
        assert_eq!(reverse_complement("acgtN"), "Nacgt");
        assert_eq!(reverse_complement("ANnT"), "AnNT");
    }

    #[test]
    fn test_reverse_complement_involution() {
        for seq in ["ACGTACGTACGT", "NNNN", "GATTACA", ""] {
            assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
        }
    }

    #[test]
    fn test_encode_strand_one_hit_per_column() {
        let seq = "ACGTACGTACG";
        let ratios: Vec<f32> = (0..WINDOW_LEN).map(|i| (i + 1) as f32 / 100.0).collect();
        let matrix = encode_strand(seq, &ratios);

        assert_eq!(matrix.len(), NUM_BASES * WINDOW_LEN);
        for col in 0..WINDOW_LEN {
            let column_sum: f32 = (0..NUM_BASES).map(|row| matrix[row * WINDOW_LEN + col]).sum();
            assert_eq!(column_sum, ratios[col]);
            let nonzero = (0..NUM_BASES)
                .filter(|row| matrix[row * WINDOW_LEN + col] != 0.0)
                .count();
            assert!(nonzero <= 1);
        }
        // row placement: position 0 is 'A' → row 0
        assert_eq!(matrix[0], ratios[0]);
        // position 1 is 'C' → row 1
        assert_eq!(matrix[WINDOW_LEN + 1], ratios[1]);
    }

    #[test]
    fn test_encode_strand_untracked_base_is_all_zero() {
        let matrix = encode_strand("ANGT", &[0.1, 0.2, 0.3, 0.4]);
        let col = 1;
        for row in 0..NUM_BASES {
            assert_eq!(matrix[row * 4 + col], 0.0);
        }
    }

    #[test]
    fn test_encode_site_shape_and_stacking() {
        let record = CpgRecord {
            chrom: "chr1".to_string(),
            start: 10,
            watson_seq: "AAAAAAAAAAA".to_string(),
            crick_seq: "TTTTTTTTTTT".to_string(),
            watson_ratios: vec![1.0; WINDOW_LEN],
            crick_ratios: vec![0.5; WINDOW_LEN],
            label: Label::Methylated,
        };
        let matrix = encode_site(&record);
        assert_eq!(matrix.len(), MATRIX_ROWS * WINDOW_LEN);
        // Watson all-A fills row 0 of the top block
        assert!(matrix[..WINDOW_LEN].iter().all(|&v| v == 1.0));
        // Crick all-T fills row 3 of the bottom block (absolute row 7)
        assert!(matrix[7 * WINDOW_LEN..].iter().all(|&v| v == 0.5));
    }
}
