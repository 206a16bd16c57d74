use std::path::Path;
use std::process::Command;

/// Compiler contract for the compile stage.
///
/// The runner ships exactly one implementation; the trait is the seam tests
/// use to stand in for a compiler that fails or writes nothing.
pub trait Toolchain: Send + Sync {
    /// Program name, used in diagnostics
    fn name(&self) -> &str;

    /// Command that builds `artifact` from `source`
    fn compile_command(&self, source: &Path, artifact: &Path) -> Command;
}

/// The system C toolchain driver with debug symbols enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCompiler;

impl SystemCompiler {
    pub const PROGRAM: &'static str = "gcc";
    pub const DEBUG_FLAG: &'static str = "-g";
}

impl Toolchain for SystemCompiler {
    fn name(&self) -> &str {
        Self::PROGRAM
    }

    fn compile_command(&self, source: &Path, artifact: &Path) -> Command {
        let mut command = Command::new(Self::PROGRAM);
        command
            .arg(Self::DEBUG_FLAG)
            .arg("-o")
            .arg(artifact)
            .arg(source);
        command
    }
}

/// Render a command line for logs
pub fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_compiler_command_line() {
        let command = SystemCompiler.compile_command(Path::new("t/ret42.s"), Path::new("t/ret42"));
        assert_eq!(describe(&command), "gcc -g -o t/ret42 t/ret42.s");
    }

    #[test]
    fn test_system_compiler_name() {
        assert_eq!(SystemCompiler.name(), "gcc");
    }
}
