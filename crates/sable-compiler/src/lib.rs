//! The semantic core: four passes from a located AST to emitted code.
//!
//! [`Compiler::compile`] drives the pipeline. Type creation declares
//! every class and synthesizes supertyping adapters; element creation
//! declares members, checks abstract obligations and synthesizes
//! iterator state holders; checking resolves every name, call and mode
//! against the registry; code generation emits label-addressed code for
//! each body plus the synthesized machinery.
//!
//! Diagnostics accumulate across a pass, so one run reports every error
//! that pass can see. A pass that ends with errors stops the pipeline;
//! later passes assume a clean context.

pub mod code;
pub mod context;
pub mod overload;
pub mod passes;
pub mod scope;

pub use code::{CodeBuilder, CodeChunk, FieldRef, Instr, IterStep, Label, Op, Operand};
pub use context::{
    CallBinding, CompilationContext, CompileOptions, IterCallInfo, NameResolution, WellKnown,
};
pub use overload::{ArgInfo, ResolveError};
pub use passes::{Check, Codegen, CompiledProgram, CompiledRoutine, ElementCreation, EntryPoint, TypeCreation};

use sable_ast::SourceUnit;
use sable_core::{Diagnostics, RegistryError};
use sable_registry::BuiltinEnvironment;

/// What one compilation produced: the program (when every pass ran
/// clean) and everything diagnosed along the way.
#[derive(Debug, Default)]
pub struct CompilationResult {
    pub program: Option<CompiledProgram>,
    pub diagnostics: Diagnostics,
}

impl CompilationResult {
    pub fn is_success(&self) -> bool {
        self.program.is_some() && !self.diagnostics.has_errors()
    }
}

/// The pass driver.
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Run all four passes over `unit` against `env`'s builtins.
    ///
    /// Fails with a [`RegistryError`] only when the environment itself is
    /// malformed; user-program problems surface as diagnostics.
    pub fn compile(
        &self,
        unit: &SourceUnit<'_>,
        env: &BuiltinEnvironment,
    ) -> Result<CompilationResult, RegistryError> {
        let mut ctx = CompilationContext::new(env, self.options)?;

        passes::TypeCreation::new(&mut ctx).run(unit);
        if ctx.diags.has_errors() {
            return Ok(Self::failed(ctx));
        }
        passes::ElementCreation::new(&mut ctx).run(unit);
        if ctx.diags.has_errors() {
            return Ok(Self::failed(ctx));
        }
        passes::Check::new(&mut ctx).run(unit);
        if ctx.diags.has_errors() {
            return Ok(Self::failed(ctx));
        }
        let program = passes::Codegen::new(&mut ctx).run(unit);
        if ctx.diags.has_errors() {
            return Ok(Self::failed(ctx));
        }
        Ok(CompilationResult {
            program: Some(program),
            diagnostics: ctx.diags,
        })
    }

    fn failed(ctx: CompilationContext) -> CompilationResult {
        CompilationResult {
            program: None,
            diagnostics: ctx.diags,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use sable_ast::{AstBuilder, ClassKindSpec};

    #[test]
    fn a_clean_unit_compiles_to_a_program() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let unit = b.unit(vec![b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine("m", vec![], None, Some(b.block(vec![])))],
        )]);
        let result = Compiler::default()
            .compile(&unit, &BuiltinEnvironment::minimal())
            .unwrap();
        assert!(result.is_success(), "{:?}", result.diagnostics.error_messages());
        assert!(result.program.unwrap().routines.iter().any(|r| r.name == "m"));
    }

    #[test]
    fn errors_stop_the_pipeline_before_emission() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        // $A demands 'foo'; C never provides it.
        let unit = b.unit(vec![
            b.class(
                "$A",
                ClassKindSpec::Abstract,
                vec![],
                vec![],
                vec![b.routine("foo", vec![], Some("INT"), None)],
            ),
            b.class("C", ClassKindSpec::Reference, vec!["$A"], vec![], vec![]),
        ]);
        let result = Compiler::default()
            .compile(&unit, &BuiltinEnvironment::minimal())
            .unwrap();
        assert!(!result.is_success());
        assert!(result.program.is_none());
        assert!(
            result
                .diagnostics
                .error_messages()
                .iter()
                .any(|m| m.contains("no implementation of 'foo'"))
        );
    }
}
