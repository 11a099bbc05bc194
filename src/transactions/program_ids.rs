/// Program IDs the pipeline monitors or decodes
///
/// Monitored programs are polled for new signatures; token programs are the
/// ones whose transfer instructions the normalizer extracts.

// =============================================================================
// TOKEN PROGRAMS
// =============================================================================

/// SPL Token program
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 program
pub const SPL_TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

// =============================================================================
// DEX PROGRAMS
// =============================================================================

/// Jupiter v6 aggregator
pub const JUPITER_V6_PROGRAM_ID: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

/// Raydium concentrated liquidity
pub const RAYDIUM_CLMM_PROGRAM_ID: &str = "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK";

/// Orca Whirlpool
pub const ORCA_WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";

// =============================================================================
// PROGRAM NAMES
// =============================================================================

/// Program names used by jsonParsed encoding for the token programs
pub const SPL_TOKEN_PROGRAM_NAME: &str = "spl-token";
pub const SPL_TOKEN_2022_PROGRAM_NAME: &str = "spl-token-2022";

/// Whether a jsonParsed `program` name belongs to a token program
pub fn is_token_program_name(program: &str) -> bool {
    program == SPL_TOKEN_PROGRAM_NAME || program == SPL_TOKEN_2022_PROGRAM_NAME
}

/// Human readable label for logs
pub fn program_label(program_id: &str) -> &'static str {
    match program_id {
        SPL_TOKEN_PROGRAM_ID => "spl-token",
        SPL_TOKEN_2022_PROGRAM_ID => "spl-token-2022",
        JUPITER_V6_PROGRAM_ID => "jupiter-v6",
        RAYDIUM_CLMM_PROGRAM_ID => "raydium-clmm",
        ORCA_WHIRLPOOL_PROGRAM_ID => "orca-whirlpool",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    #[test]
    fn program_ids_are_valid_pubkeys() {
        for id in [
            SPL_TOKEN_PROGRAM_ID,
            SPL_TOKEN_2022_PROGRAM_ID,
            JUPITER_V6_PROGRAM_ID,
            RAYDIUM_CLMM_PROGRAM_ID,
            ORCA_WHIRLPOOL_PROGRAM_ID,
        ] {
            assert!(Pubkey::from_str(id).is_ok(), "{} is not a pubkey", id);
        }
    }

    #[test]
    fn token_program_ids_match_sdk_crates() {
        assert_eq!(SPL_TOKEN_PROGRAM_ID, spl_token::id().to_string());
        assert_eq!(SPL_TOKEN_2022_PROGRAM_ID, spl_token_2022::id().to_string());
    }

    #[test]
    fn labels() {
        assert_eq!(program_label(JUPITER_V6_PROGRAM_ID), "jupiter-v6");
        assert_eq!(program_label("11111111111111111111111111111111"), "unknown");
        assert!(is_token_program_name("spl-token-2022"));
        assert!(!is_token_program_name("system"));
    }
}
