//! Node identity derivation
//!
//! Pure helpers that fold a 96-bit factory device UID into the
//! network-facing identifiers: a locally-administered unicast MAC
//! address and a network stack seed. The board crate wraps these with
//! the hardware UID; keeping the folding here makes it host-testable.

/// Fold the 96-bit UID into a locally-administered unicast MAC address.
///
/// The first octet is 0x02 (locally administered, unicast). The UID mixes
/// per-chip wafer coordinates with a mostly-constant lot number, so both
/// halves are folded to keep chips from the same lot distinct.
pub fn mac_from_uid(uid: &[u8; 12]) -> [u8; 6] {
    [
        0x02,
        uid[0] ^ uid[6],
        uid[1] ^ uid[7],
        uid[2] ^ uid[8],
        uid[3] ^ uid[9],
        uid[4] ^ uid[10],
    ]
}

/// Fold the 96-bit UID into a 64-bit stack seed.
pub fn seed_from_uid(uid: &[u8; 12]) -> u64 {
    let mut low = [0u8; 8];
    low.copy_from_slice(&uid[..8]);
    let high = u32::from_le_bytes([uid[8], uid[9], uid[10], uid[11]]);
    u64::from_le_bytes(low) ^ (u64::from(high) << 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: [u8; 12] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x10, 0x20, 0x30, 0x40, 0x50, 0x60,
    ];

    #[test]
    fn mac_is_locally_administered_unicast() {
        let mac = mac_from_uid(&UID);
        assert_eq!(mac[0] & 0x03, 0x02);
    }

    #[test]
    fn mac_folds_both_uid_halves() {
        let mac = mac_from_uid(&UID);
        assert_eq!(mac, [0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn mac_differs_within_one_lot() {
        // Same lot number (last half), different wafer coordinates
        let mut other = UID;
        other[0] ^= 0x04;
        assert_ne!(mac_from_uid(&UID), mac_from_uid(&other));
    }

    #[test]
    fn seed_differs_between_devices() {
        let mut other = UID;
        other[0] ^= 0xFF;
        assert_ne!(seed_from_uid(&UID), seed_from_uid(&other));
    }

    #[test]
    fn seed_uses_the_full_uid() {
        // A change in the high third of the UID must change the seed
        let mut other = UID;
        other[11] ^= 0xFF;
        assert_ne!(seed_from_uid(&UID), seed_from_uid(&other));
    }
}
