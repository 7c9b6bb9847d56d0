//! End-to-end tests through the public compilation pipeline.
//!
//! Each test builds a complete source unit, runs all four passes via
//! [`Compiler`], and asserts on the diagnostics or the emitted program.

use bumpalo::Bump;
use sable::compiler::{IterStep, Operand};
use sable::core::{MethodId, MethodSignature, Param};
use sable::prelude::*;

fn compile(unit: &SourceUnit<'_>) -> CompilationResult {
    Compiler::default()
        .compile(unit, &BuiltinEnvironment::minimal())
        .unwrap()
}

fn compile_executable(unit: &SourceUnit<'_>) -> CompilationResult {
    Compiler::new(CompileOptions { executable: true })
        .compile(unit, &BuiltinEnvironment::minimal())
        .unwrap()
}

fn errors(result: &CompilationResult) -> Vec<String> {
    result
        .diagnostics
        .error_messages()
        .iter()
        .map(|m| m.to_string())
        .collect()
}

// =============================================================================
// Obligations and supertyping
// =============================================================================

#[test]
fn missing_obligation_names_the_method_and_both_classes() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![
        b.class(
            "$SHAPE",
            ClassKindSpec::Abstract,
            vec![],
            vec![],
            vec![b.routine("area", vec![], Some("INT"), None)],
        ),
        b.class(
            "SQUARE",
            ClassKindSpec::Reference,
            vec!["$SHAPE"],
            vec![],
            vec![],
        ),
    ]);
    let result = compile(&unit);
    assert!(!result.is_success());
    let messages = errors(&result);
    assert!(
        messages
            .iter()
            .any(|m| m.contains("'area'") && m.contains("'$SHAPE'") && m.contains("'SQUARE'")),
        "{messages:?}"
    );
}

#[test]
fn declared_subtypes_synthesize_working_adapters() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    // $ADDABLE claims INT from above; the container's plus discharges it.
    let unit = b.unit(vec![
        b.class(
            "$ADDABLE",
            ClassKindSpec::Abstract,
            vec![],
            vec!["INT"],
            vec![b.routine(
                "plus",
                vec![b.param("other", Mode::In, "INT")],
                Some("INT"),
                None,
            )],
        ),
        b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "m",
                vec![],
                None,
                Some(b.block(vec![b.local("a", "$ADDABLE", Some(b.int(5)))])),
            )],
        ),
    ]);
    let result = compile(&unit);
    assert!(result.is_success(), "{:?}", errors(&result));
    let program = result.program.unwrap();
    // The INT value is wrapped through the adapter's constructor, not
    // boxed raw.
    let m = program.routines.iter().find(|r| r.name == "m").unwrap();
    assert!(m.code.instrs.iter().any(|i| i.op == Op::CallCtor));
    assert!(m.code.instrs.iter().all(|i| i.op != Op::Box_));
    // The adapter contributes its constructor and one bridge.
    assert!(
        program
            .routines
            .iter()
            .any(|r| r.name == "plus" && r.code.instrs.first().map(|i| i.op) == Some(Op::LoadSelf))
    );
}

#[test]
fn conflicting_signatures_on_one_class_are_rejected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![
        b.class("$A", ClassKindSpec::Abstract, vec![], vec![], vec![]),
        b.class(
            "$B",
            ClassKindSpec::Abstract,
            vec!["$A"],
            vec![],
            vec![],
        ),
        b.class(
            "C",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![
                b.routine("m", vec![b.param("x", Mode::In, "$A")], None, Some(b.block(vec![]))),
                b.routine("m", vec![b.param("x", Mode::In, "$B")], None, Some(b.block(vec![]))),
            ],
        ),
    ]);
    let result = compile(&unit);
    assert!(!result.is_success());
    assert!(
        errors(&result).iter().any(|m| m.contains("conflicts")),
        "{:?}",
        errors(&result)
    );
}

#[test]
fn supertype_cycles_are_reported_not_looped() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![
        b.class("$A", ClassKindSpec::Abstract, vec!["$B"], vec![], vec![]),
        b.class("$B", ClassKindSpec::Abstract, vec!["$A"], vec![], vec![]),
    ]);
    let result = compile(&unit);
    assert!(!result.is_success());
    assert!(
        errors(&result).iter().any(|m| m.contains("circular")),
        "{:?}",
        errors(&result)
    );
}

// =============================================================================
// Overload resolution
// =============================================================================

#[test]
fn most_specific_in_parameter_wins() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![
            b.routine("m", vec![b.param("x", Mode::In, "INT")], None, Some(b.block(vec![]))),
            b.routine("m", vec![b.param("x", Mode::In, "STR")], None, Some(b.block(vec![]))),
            b.routine(
                "n",
                vec![],
                None,
                Some(b.block(vec![b.expr_stmt(b.call(
                    Some(b.self_expr()),
                    "m",
                    vec![b.arg(b.int(1))],
                ))])),
            ),
        ],
    )]);
    let result = compile(&unit);
    assert!(result.is_success(), "{:?}", errors(&result));
    let program = result.program.unwrap();
    let n = program.routines.iter().find(|r| r.name == "n").unwrap();

    let owner = TypeId::from_name("C");
    let expected: MethodId = MethodSignature::new(
        owner,
        "m",
        vec![Param::new("x", Mode::In, TypeId::from_name("INT"))],
        None,
    )
    .id();
    assert!(
        n.code
            .instrs
            .iter()
            .any(|i| i.operands.contains(&Operand::Method(expected)))
    );
}

#[test]
fn unresolvable_calls_are_diagnosed() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![b.routine(
            "n",
            vec![],
            None,
            Some(b.block(vec![b.expr_stmt(b.call(
                Some(b.self_expr()),
                "nope",
                vec![],
            ))])),
        )],
    )]);
    let result = compile(&unit);
    assert!(!result.is_success());
    assert!(
        errors(&result).iter().any(|m| m.contains("'nope'")),
        "{:?}",
        errors(&result)
    );
}

#[test]
fn out_arguments_require_assignable_places() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![
            b.routine(
                "m",
                vec![b.param("x", Mode::Out, "INT")],
                None,
                Some(b.block(vec![b.assign("x", b.int(0))])),
            ),
            b.routine(
                "n",
                vec![],
                None,
                Some(b.block(vec![b.expr_stmt(b.call(
                    Some(b.self_expr()),
                    "m",
                    vec![b.arg_mode(Mode::Out, b.int(5))],
                ))])),
            ),
        ],
    )]);
    let result = compile(&unit);
    assert!(!result.is_success());
    assert!(
        errors(&result)
            .iter()
            .any(|m| m.contains("'out' argument must be an assignable local")),
        "{:?}",
        errors(&result)
    );
}

// =============================================================================
// Iterators
// =============================================================================

#[test]
fn one_yield_gives_two_resume_points() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![b.iter(
            "once!",
            vec![],
            Some("INT"),
            Some(b.block(vec![b.yield_stmt(Some(b.int(42)))])),
        )],
    )]);
    let result = compile(&unit);
    assert!(result.is_success(), "{:?}", errors(&result));
    let program = result.program.unwrap();
    let body = program.routines.iter().find(|r| r.name == "once!").unwrap();
    let switch = body
        .code
        .instrs
        .iter()
        .find(|i| i.op == Op::Switch)
        .expect("resume dispatch");
    let Some(Operand::Labels(labels)) = switch.operands.first() else {
        panic!("switch needs a label table");
    };
    // Entry plus the single yield.
    assert_eq!(labels.len(), 2);

    // The yield hands a value back and fall-through exhausts; both return
    // to the caller immediately after announcing the step.
    let steps: Vec<IterStep> = body
        .code
        .instrs
        .iter()
        .enumerate()
        .filter(|(_, i)| i.op == Op::PushStep)
        .map(|(at, i)| {
            assert_eq!(body.code.instrs[at + 1].op, Op::Return);
            match i.operands.first() {
                Some(&Operand::Step(step)) => step,
                other => panic!("step operand, got {other:?}"),
            }
        })
        .collect();
    assert_eq!(steps, vec![IterStep::Value, IterStep::Exhausted]);
}

#[test]
fn builtin_range_iteration_compiles_end_to_end() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![b.routine(
            "sum_to",
            vec![b.param("n", Mode::In, "INT")],
            None,
            Some(b.block(vec![b.loop_stmt(b.block(vec![
                b.local("i", "INT", Some(b.call(Some(b.int(0)), "upto!", vec![b.arg(b.name("n"))]))),
            ]))])),
        )],
    )]);
    let result = compile(&unit);
    assert!(result.is_success(), "{:?}", errors(&result));
    let program = result.program.unwrap();
    let body = program
        .routines
        .iter()
        .find(|r| r.name == "sum_to")
        .unwrap();
    let ops: Vec<Op> = body.code.instrs.iter().map(|i| i.op).collect();
    let init = ops.iter().position(|&op| op == Op::IterInit).unwrap();
    let next = ops.iter().position(|&op| op == Op::IterNext).unwrap();
    assert!(init < next);
    assert!(ops.contains(&Op::IterCurrent));
}

// =============================================================================
// Executable programs
// =============================================================================

#[test]
fn a_full_program_compiles_and_wires_main() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![
        b.class(
            "$GREETER",
            ClassKindSpec::Abstract,
            vec![],
            vec![],
            vec![b.routine("greet", vec![], Some("STR"), None)],
        ),
        b.class(
            "ENGLISH",
            ClassKindSpec::Reference,
            vec!["$GREETER"],
            vec![],
            vec![b.routine(
                "greet",
                vec![],
                Some("STR"),
                Some(b.block(vec![b.ret(Some(b.str_lit("hello")))])),
            )],
        ),
        b.class(
            "MAIN",
            ClassKindSpec::Reference,
            vec![],
            vec![],
            vec![b.routine(
                "main",
                vec![],
                None,
                Some(b.block(vec![b.local("g", "ENGLISH", None)])),
            )],
        ),
    ]);
    let result = compile_executable(&unit);
    assert!(result.is_success(), "{:?}", errors(&result));
    let program = result.program.unwrap();
    let entry = program.entry_point.expect("entry point");
    assert_eq!(entry.class, TypeId::from_name("MAIN"));
    assert!(program.routines.iter().any(|r| r.name == "$entry"));
    // Every declared class got its synthesized slots alongside the
    // user bodies.
    assert!(program.routines.iter().any(|r| r.name == "greet"));
    assert!(
        program
            .routines
            .iter()
            .filter(|r| r.name == "create")
            .count()
            >= 2
    );
}

#[test]
fn executables_demand_a_main_class() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let unit = b.unit(vec![b.class(
        "C",
        ClassKindSpec::Reference,
        vec![],
        vec![],
        vec![],
    )]);
    let result = compile_executable(&unit);
    assert!(!result.is_success());
    assert!(
        errors(&result).iter().any(|m| m.contains("'MAIN'")),
        "{:?}",
        errors(&result)
    );
}
