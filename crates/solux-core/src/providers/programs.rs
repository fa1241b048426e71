//! Well-known program IDs and display names.

/// SPL Token program.
pub const SPL_TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// System program.
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

const KNOWN_PROGRAMS: &[(&str, &str)] = &[
    (SPL_TOKEN_PROGRAM, "SPL Token"),
    ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "Associated Token Account"),
    ("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "Memo"),
    (SYSTEM_PROGRAM, "System Program"),
    ("Vote111111111111111111111111111111111111111", "Vote Program"),
    ("Stake11111111111111111111111111111111111111", "Stake Program"),
    ("ComputeBudget111111111111111111111111111111", "Compute Budget"),
];

/// Display name for a well-known program, when recognized.
#[must_use]
pub fn known_program_name(program_id: &str) -> Option<&'static str> {
    KNOWN_PROGRAMS.iter().find(|(id, _)| *id == program_id).map(|(_, name)| *name)
}
