use crate::types::ShaderKind;

/// Failures that stop an effect from being built.
///
/// None of these reach the page: the controller catches the first one, logs
/// it, and settles into an inert state. A missing uniform or attribute is not
/// represented here; lookups return `None` and the matching write is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    #[error("no graphics context available (tried {tried})")]
    ContextUnavailable { tried: String },
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderKind, log: String },
    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },
    #[error("failed to allocate {resource}: {reason}")]
    ResourceAllocation {
        resource: &'static str,
        reason: String,
    },
}

impl EffectError {
    /// Stable identifier for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            EffectError::ContainerNotFound(_) => "CONTAINER_NOT_FOUND",
            EffectError::ContextUnavailable { .. } => "CONTEXT_UNAVAILABLE",
            EffectError::ShaderCompile { .. } => "SHADER_COMPILE_FAILED",
            EffectError::ProgramLink { .. } => "PROGRAM_LINK_FAILED",
            EffectError::ResourceAllocation { .. } => "RESOURCE_ALLOCATION_FAILED",
        }
    }

    /// Driver diagnostic attached to compile and link failures.
    pub fn diagnostic_log(&self) -> Option<&str> {
        match self {
            EffectError::ShaderCompile { log, .. } | EffectError::ProgramLink { log } => {
                Some(log.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_failure_classes() {
        let compile = EffectError::ShaderCompile {
            stage: ShaderKind::Fragment,
            log: "ERROR: 0:3: syntax error".into(),
        };
        assert_eq!(compile.code(), "SHADER_COMPILE_FAILED");
        assert_eq!(compile.diagnostic_log(), Some("ERROR: 0:3: syntax error"));
        assert_eq!(
            compile.to_string(),
            "fragment shader failed to compile: ERROR: 0:3: syntax error"
        );

        let link = EffectError::ProgramLink {
            log: "varying mismatch".into(),
        };
        assert_eq!(link.code(), "PROGRAM_LINK_FAILED");

        let missing = EffectError::ContainerNotFound("aurora-container".into());
        assert_eq!(missing.code(), "CONTAINER_NOT_FOUND");
        assert!(missing.diagnostic_log().is_none());
    }
}
