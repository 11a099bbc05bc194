use crate::config_struct;
use crate::transactions::program_ids::{
    JUPITER_V6_PROGRAM_ID, ORCA_WHIRLPOOL_PROGRAM_ID, RAYDIUM_CLMM_PROGRAM_ID,
    SPL_TOKEN_2022_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID,
};

// ============================================================================
// MONITORED PROGRAMS
// ============================================================================

config_struct! {
    /// A program whose signatures are polled
    pub struct ProgramConfig {
        name: String = String::new(),
        address: String = String::new(),
    }
}

fn program(name: &str, address: &str) -> ProgramConfig {
    ProgramConfig {
        name: name.to_string(),
        address: address.to_string(),
    }
}

config_struct! {
    /// What the poller watches and which programs count as token transfers
    pub struct MonitorConfig {
        /// Programs polled for new signatures
        programs: Vec<ProgramConfig> = vec![
            program("SPL_TOKEN", SPL_TOKEN_PROGRAM_ID),
            program("JUPITER_V6", JUPITER_V6_PROGRAM_ID),
            program("RAYDIUM_CLMM", RAYDIUM_CLMM_PROGRAM_ID),
            program("ORCA_WHIRLPOOL", ORCA_WHIRLPOOL_PROGRAM_ID),
        ],

        /// Token programs whose transfer instructions are extracted
        token_programs: Vec<String> = vec![
            SPL_TOKEN_PROGRAM_ID.to_string(),
            SPL_TOKEN_2022_PROGRAM_ID.to_string(),
        ],
    }
}
