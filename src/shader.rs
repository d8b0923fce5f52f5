//! Shader source preprocessing and program linking.

use log::trace;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::types::ShaderStage;

/// Substitute the first `#include "path"` directive in `source` with the
/// text produced by `resolve`.
///
/// Only the first directive is expanded and the included text is spliced in
/// verbatim, so nested includes stay unexpanded. Sources are expected to
/// declare at most one shared preamble.
pub fn expand_includes(
    source: &str,
    resolve: impl FnOnce(&str) -> Option<String>,
) -> Result<String, GraphicsError> {
    for line in source.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("#include") else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(path) = rest
            .strip_prefix('"')
            .and_then(|p| p.split_once('"'))
            .map(|(path, _)| path)
        else {
            continue;
        };
        let included =
            resolve(path).ok_or_else(|| GraphicsError::IncludeNotFound(path.to_string()))?;
        return Ok(source.replacen(line, &included, 1));
    }
    Ok(source.to_string())
}

/// A linked shader program. Stage shader objects are deleted once linking
/// succeeds; only the program object outlives the build.
pub struct Program {
    handle: RawHandle,
}

impl Program {
    /// Compile every stage and link them. On a stage failure the driver's
    /// diagnostic log is preserved in the error.
    pub fn build(
        driver: &mut dyn Driver,
        stages: &[(ShaderStage, &str)],
    ) -> Result<Self, GraphicsError> {
        let mut shaders = Vec::with_capacity(stages.len());
        for &(stage, source) in stages {
            let shader = driver.create_shader(stage);
            if let Err(log) = driver.compile_shader(shader, source) {
                driver.delete_shader(shader);
                for shader in shaders {
                    driver.delete_shader(shader);
                }
                return Err(GraphicsError::ShaderCompilation { stage, log });
            }
            trace!("compiled {stage} shader {shader}");
            shaders.push(shader);
        }

        let program = driver.create_program();
        for &shader in &shaders {
            driver.attach_shader(program, shader);
        }
        let linked = driver.link_program(program);
        for shader in shaders {
            driver.delete_shader(shader);
        }
        match linked {
            Ok(()) => Ok(Self { handle: program }),
            Err(log) => {
                driver.delete_program(program);
                Err(GraphicsError::ProgramLink(log))
            }
        }
    }
}

impl GpuResource for Program {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Dispose for Program {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_program(self.handle);
            self.handle = RawHandle::NONE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    #[test]
    fn test_expand_first_include_only() {
        let source = "#version 450\n#include \"common.glsl\"\n#include \"other.glsl\"\nvoid main() {}\n";
        let expanded = expand_includes(source, |path| {
            assert_eq!(path, "common.glsl");
            Some("const float PI = 3.14159;".to_string())
        })
        .unwrap();
        assert!(expanded.contains("const float PI"));
        assert!(expanded.contains("#include \"other.glsl\""));
        assert!(!expanded.contains("#include \"common.glsl\""));
    }

    #[test]
    fn test_missing_include_fails() {
        let source = "#include \"nope.glsl\"\n";
        assert_eq!(
            expand_includes(source, |_| None),
            Err(GraphicsError::IncludeNotFound("nope.glsl".to_string()))
        );
    }

    #[test]
    fn test_source_without_includes_is_unchanged() {
        let source = "void main() {}\n";
        assert_eq!(
            expand_includes(source, |_| panic!("resolver must not run")).unwrap(),
            source
        );
    }

    #[test]
    fn test_build_and_link() {
        let mut driver = NullDriver::new();
        let program = Program::build(
            &mut driver,
            &[
                (ShaderStage::Vertex, "void main() {}"),
                (ShaderStage::Fragment, "void main() {}"),
            ],
        )
        .unwrap();
        assert!(program.raw_handle().is_valid());
    }

    #[test]
    fn test_compile_failure_carries_stage_and_log() {
        let mut driver = NullDriver::new();
        let result = Program::build(
            &mut driver,
            &[
                (ShaderStage::Vertex, "void main() {}"),
                (ShaderStage::Fragment, "#error broken"),
            ],
        );
        match result {
            Err(GraphicsError::ShaderCompilation { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected a compile failure"),
        }
    }

    #[test]
    fn test_empty_stage_list_fails_link() {
        let mut driver = NullDriver::new();
        assert!(matches!(
            Program::build(&mut driver, &[]),
            Err(GraphicsError::ProgramLink(_))
        ));
    }
}
