//! Metadata-driven permission checks, applied after validation.

use tabletalk_domain::ExecutionContext;

use crate::commands::CommandMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PermissionDenied {
    #[error("Only the GM can use this command")]
    AdminOnly,
    #[error("This command can only be used during combat")]
    CombatInactive,
    #[error("You need an active character to use this command")]
    NoActiveCharacter,
}

/// Admin first, then combat, then acting character.
pub fn check_permissions(
    metadata: &CommandMetadata,
    ctx: &ExecutionContext,
) -> Result<(), PermissionDenied> {
    if metadata.admin_only && !ctx.permissions.is_gm {
        return Err(PermissionDenied::AdminOnly);
    }
    if metadata.requires_combat && !ctx.environment.combat_active {
        return Err(PermissionDenied::CombatInactive);
    }
    if metadata.requires_target && ctx.current_character.is_none() {
        return Err(PermissionDenied::NoActiveCharacter);
    }
    Ok(())
}
