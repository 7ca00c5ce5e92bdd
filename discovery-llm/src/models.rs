//! Default model ids for the supported providers

pub mod claude {
    pub const SONNET_4_5_ID: &str = "claude-sonnet-4-5-20250929";
}

pub mod gemini {
    pub const GEMINI_2_0_FLASH_ID: &str = "gemini-2.0-flash";
}
