//! Integrity codec for the settings record.
//!
//! The trailer is two bytes: `[checksum, magic]`.  The checksum byte is
//! chosen so that the weighted sum of the *whole* image, trailer included,
//! reduces to zero modulo [`CHECK_PRIME`].  Validation is then a single pass
//! plus a comparison of the magic byte.
//!
//! # How the weighted sum works (for beginners)
//!
//! Each byte is multiplied by an alternating weight (1, 2, 1, 2, …) and added
//! to a running total that is reduced modulo 127 after every step.  The
//! alternating weight means two swapped neighbouring bytes usually change the
//! result, which a plain sum would miss.
//!
//! When [`update`] runs, the payload sum `S` is computed and the checksum
//! byte is set to `(127 - S) mod 127`.  That byte sits at an even offset, so
//! it carries weight 1; the magic byte at the odd offset contributes
//! `2 * 127`, which is itself a multiple of 127.  Adding both to `S` gives
//! exactly 0 mod 127.
//!
//! This is a soft corruption detector for uninitialised or worn storage, not a
//! security mechanism.

use tracing::debug;

use crate::settings::record::{RecordImage, SettingsRecord, PAYLOAD_SIZE, RECORD_SIZE};

/// Modulus of the weighted sum, also used as the magic fingerprint byte.
pub const CHECK_PRIME: i16 = 127;

/// Value of the trailer's second byte once [`update`] has run.
pub const MAGIC: u8 = CHECK_PRIME as u8;

/// Weighted checksum of `bytes`: weight `1 + (i % 2)` per offset `i`,
/// reduced modulo [`CHECK_PRIME`] at every step.
///
/// Bytes are read as unsigned values, so the result is always in `0..127`.
pub fn checksum(bytes: &[u8]) -> i8 {
    let mut sum: i16 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let weight = 1 + (i % 2) as i16;
        sum = (sum + weight * i16::from(byte)) % CHECK_PRIME;
    }
    sum as i8
}

/// Stamps the trailer of a raw image so that [`check_image`] passes.
pub fn update_image(image: &mut RecordImage) {
    let negated = -i16::from(checksum(&image[..PAYLOAD_SIZE]));
    let folded = if negated < 0 {
        negated + CHECK_PRIME
    } else {
        negated
    };
    image[PAYLOAD_SIZE] = folded as u8;
    image[PAYLOAD_SIZE + 1] = MAGIC;
    debug!(checksum = folded, "settings trailer updated");
}

/// `true` iff the magic byte is present and the whole image sums to zero.
pub fn check_image(image: &RecordImage) -> bool {
    image[RECORD_SIZE - 1] == MAGIC && checksum(image) == 0
}

/// Recomputes the record's trailer from its current field values.
pub fn update(record: &mut SettingsRecord) {
    let mut image = record.to_image();
    update_image(&mut image);
    record.set_checksum_trailer([image[PAYLOAD_SIZE], image[PAYLOAD_SIZE + 1]]);
}

/// `true` iff the record's encoded image passes [`check_image`].
pub fn check(record: &SettingsRecord) -> bool {
    check_image(&record.to_image())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Small deterministic generator so fixtures are reproducible.
    fn pseudo_random_image(seed: u32) -> RecordImage {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        let mut image = [0u8; RECORD_SIZE];
        for byte in image.iter_mut() {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *byte = (state >> 24) as u8;
        }
        image
    }

    #[test]
    fn test_checksum_applies_alternating_weights() {
        // 1*10 + 2*20 + 1*30 = 80
        assert_eq!(checksum(&[10, 20, 30]), 80);
    }

    #[test]
    fn test_checksum_reduces_modulo_prime() {
        // 1*100 + 2*100 = 300 → 300 mod 127 = 46
        assert_eq!(checksum(&[100, 100]), 46);
    }

    #[test]
    fn test_checksum_of_empty_buffer_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_update_image_makes_whole_sum_zero_for_many_buffers() {
        for seed in 0..256 {
            // Arrange
            let mut image = pseudo_random_image(seed);

            // Act
            update_image(&mut image);

            // Assert
            assert_eq!(checksum(&image), 0, "seed {seed}");
            assert_eq!(image[RECORD_SIZE - 1], 127, "seed {seed}");
            assert!(check_image(&image));
        }
    }

    #[test]
    fn test_update_image_checksum_byte_is_in_prime_range() {
        for seed in 0..64 {
            let mut image = pseudo_random_image(seed);
            update_image(&mut image);
            assert!(image[PAYLOAD_SIZE] < 127);
        }
    }

    #[test]
    fn test_all_ff_image_fails_check() {
        let image = [0xFFu8; RECORD_SIZE];
        assert!(!check_image(&image));
    }

    #[test]
    fn test_all_zero_image_fails_check() {
        // Sum is zero but the magic byte is missing.
        let image = [0u8; RECORD_SIZE];
        assert!(!check_image(&image));
    }

    #[test]
    fn test_single_bit_flip_in_payload_is_always_detected() {
        // Arrange
        let mut image = pseudo_random_image(7);
        update_image(&mut image);

        for offset in 0..PAYLOAD_SIZE {
            // Act: a ±1 change shifts the sum by 1 or 2, never a multiple of 127.
            let mut corrupted = image;
            corrupted[offset] ^= 0x01;

            // Assert
            assert!(!check_image(&corrupted), "flip at offset {offset} undetected");
        }
    }

    #[test]
    fn test_full_byte_inversion_detected_unless_delta_cancels() {
        let mut image = pseudo_random_image(99);
        update_image(&mut image);

        for offset in 0..PAYLOAD_SIZE {
            let mut corrupted = image;
            corrupted[offset] ^= 0xFF;
            let delta = i32::from(corrupted[offset]) - i32::from(image[offset]);
            let weight = 1 + (offset % 2) as i32;
            let cancels = (weight * delta) % 127 == 0;

            assert_eq!(check_image(&corrupted), cancels, "offset {offset}");
        }
    }

    #[test]
    fn test_missing_magic_byte_fails_check() {
        let mut image = pseudo_random_image(3);
        update_image(&mut image);

        image[RECORD_SIZE - 1] = 0;

        assert!(!check_image(&image));
    }

    #[test]
    fn test_record_update_then_check_passes() {
        // Arrange
        let mut record = SettingsRecord::default();
        record.set_name("bench");
        record.set_ssid("net");

        // Act
        update(&mut record);

        // Assert
        assert!(check(&record));
        assert_eq!(record.checksum_trailer()[1], MAGIC);
    }

    #[test]
    fn test_record_mutation_after_update_fails_check() {
        let mut record = SettingsRecord::default();
        update(&mut record);

        record.set_baud_rate(9600);

        assert!(!check(&record));
    }

    #[test]
    fn test_default_record_is_not_valid_until_updated() {
        assert!(!check(&SettingsRecord::default()));
    }
}
