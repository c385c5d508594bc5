//! VM behaviour on hand-built instruction programs: frame discipline,
//! choice consumption, error conditions, and resource limits.

use libretto::{
    ChoiceOption, ChoiceTarget, Error, Input, Instruction, Limits, MemoryEnvironment, Module,
    NoEvaluator, Node, Output, PausePoint, Vm,
};
use pretty_assertions::assert_eq;

fn aside(text: &str) -> Instruction {
    Instruction::statement(
        Node::Aside {
            text: text.to_string(),
        },
        false,
    )
}

fn jump_point(label: &str) -> Instruction {
    Instruction::statement(
        Node::JumpPoint {
            label: label.to_string(),
        },
        false,
    )
}

fn jump_option(name: &str, path: Option<&str>, tag: Option<&str>) -> ChoiceOption {
    ChoiceOption {
        name: name.to_string(),
        target: ChoiceTarget::Jump {
            path: path.map(str::to_string),
            tag: tag.map(str::to_string),
        },
    }
}

fn vm(module: Module) -> Vm<MemoryEnvironment, NoEvaluator> {
    Vm::new(module, MemoryEnvironment::new(), NoEvaluator)
}

fn aside_text(output: Option<Output>) -> String {
    match output.expect("expected an output").pause_point {
        PausePoint::Aside { text } => text,
        other => panic!("expected an aside, got {other:?}"),
    }
}

#[test]
fn linear_narration_pauses_once_per_aside() {
    let module = Module::new("m", vec![aside("hi"), aside("bye")]);
    let mut vm = vm(module);

    assert_eq!(aside_text(vm.next_output(None).unwrap()), "hi");
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "bye");
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn ended_vm_stays_ended() {
    let module = Module::new("m", vec![aside("only")]);
    let mut vm = vm(module);

    vm.next_output(None).unwrap();
    assert!(vm.next_output(None).unwrap().is_none());
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn disposable_instructions_run_once() {
    let module = Module::new(
        "m",
        vec![
            Instruction::statement(
                Node::Aside {
                    text: "once".to_string(),
                },
                true,
            ),
            aside("stay"),
        ],
    );
    let mut vm = vm(module);

    assert_eq!(aside_text(vm.next_output(None).unwrap()), "once");
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "stay");
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn choice_pauses_with_option_names() {
    let module = Module::new(
        "m",
        vec![Instruction::choice(
            vec![
                jump_option("A", None, Some("t1")),
                jump_option("B", None, Some("t2")),
            ],
            false,
            false,
        )],
    );
    let mut vm = vm(module);

    let out = vm.next_output(None).unwrap().unwrap();
    assert_eq!(
        out.pause_point,
        PausePoint::Options {
            names: vec!["A".to_string(), "B".to_string()]
        }
    );
}

#[test]
fn pending_choice_input_errors_are_retryable() {
    let module = Module::new(
        "m",
        vec![
            Instruction::choice(
                vec![
                    jump_option("A", None, Some("a")),
                    jump_option("B", None, Some("b")),
                ],
                false,
                false,
            ),
            jump_point("a"),
            aside("picked a"),
            jump_point("b"),
            aside("picked b"),
        ],
    );
    let mut vm = vm(module);
    vm.next_output(None).unwrap();

    assert!(matches!(vm.next_output(None), Err(Error::MissingInput)));
    assert!(matches!(
        vm.next_output(Some(Input::default())),
        Err(Error::NullOptionIndex)
    ));
    assert!(matches!(
        vm.next_output(Some(Input::choose(7))),
        Err(Error::OptionIndexOutOfRange { index: 7, len: 2 })
    ));

    // The choice is still pending; a valid index consumes it.
    assert_eq!(
        aside_text(vm.next_output(Some(Input::choose(0))).unwrap()),
        "picked a"
    );
}

#[test]
fn selected_option_is_consumed_exactly_once() {
    let module = Module::new(
        "m",
        vec![
            Instruction::choice(vec![jump_option("A", None, Some("a"))], false, false),
            jump_point("a"),
            aside("branch"),
        ],
    );
    let mut vm = vm(module);

    vm.next_output(None).unwrap();
    assert_eq!(
        aside_text(vm.next_output(Some(Input::choose(0))).unwrap()),
        "branch"
    );
    // The next step needs no input: the pending choice is gone.
    assert!(vm.next_output(None).is_ok());
}

#[test]
fn cross_module_goto_replaces_the_frame() {
    let mut env = MemoryEnvironment::new();
    env.insert(Module::new("other", vec![aside("x")]));
    let start = Module::new(
        "start",
        vec![
            Instruction::goto(Some("other".to_string()), None, false),
            aside("never reached"),
        ],
    );
    let mut vm = Vm::new(start, env, NoEvaluator);

    assert_eq!(aside_text(vm.next_output(None).unwrap()), "x");
    // Had goto pushed instead of replaced, "never reached" would play here.
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn same_module_goto_jumps_within_the_frame() {
    let module = Module::new(
        "m",
        vec![
            Instruction::goto(None, Some("skip".to_string()), false),
            aside("skipped"),
            jump_point("skip"),
            aside("landed"),
        ],
    );
    let mut vm = vm(module);

    assert_eq!(aside_text(vm.next_output(None).unwrap()), "landed");
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn adv_end_under_a_call_clears_the_whole_stack() {
    let module = Module::new(
        "m",
        vec![
            Instruction::call(None, Some("t".to_string()), false),
            aside("never"),
            jump_point("t"),
            Instruction::adv_end(false),
        ],
    );
    let mut vm = vm(module);

    assert!(vm.next_output(None).unwrap().is_none());
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn same_module_call_returns_to_the_caller() {
    let module = Module::new(
        "m",
        vec![
            Instruction::call(None, Some("sub".to_string()), false),
            aside("back in caller"),
            Instruction::adv_end(false),
            jump_point("sub"),
            aside("in callee"),
        ],
    );
    let mut vm = vm(module);

    // The callee plays from its label to the module end, then the caller
    // resumes after the call.
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "in callee");
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "back in caller");
    assert!(vm.next_output(None).unwrap().is_none());
}

#[test]
fn repeated_same_module_calls_resolve_labels_freshly() {
    let module = Module::new(
        "m",
        vec![jump_point("l"), aside("x"), Instruction::call(None, Some("l".to_string()), false)],
    );
    let mut vm = vm(module);

    assert_eq!(aside_text(vm.next_output(None).unwrap()), "x");
    // Each call re-enters a pristine frame and rescans for the label.
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "x");
    assert_eq!(aside_text(vm.next_output(None).unwrap()), "x");
}

#[test]
fn jump_to_missing_label_fails() {
    let module = Module::new(
        "m",
        vec![Instruction::call(None, Some("nowhere".to_string()), false)],
    );
    let mut vm = vm(module);

    assert!(matches!(
        vm.next_output(None),
        Err(Error::JumpNotFound(tag)) if tag == "nowhere"
    ));
}

#[test]
fn unknown_module_load_propagates_environment_error() {
    let module = Module::new(
        "m",
        vec![Instruction::goto(Some("missing".to_string()), None, false)],
    );
    let mut vm = vm(module);

    assert!(matches!(vm.next_output(None), Err(Error::Environment(_))));
}

#[test]
fn raw_option_and_comment_nodes_are_rejected_at_execution() {
    let module = Module::new(
        "m",
        vec![Instruction::statement(
            Node::Comment {
                text: "smuggled".to_string(),
            },
            false,
        )],
    );
    let mut vm = vm(module);

    assert!(matches!(
        vm.next_output(None),
        Err(Error::UnknownInstruction("comment"))
    ));
}

#[test]
fn step_instruction_limit_stops_pause_free_loops() {
    let module = Module::new(
        "m",
        vec![
            jump_point("l"),
            Instruction::goto(None, Some("l".to_string()), false),
        ],
    );
    let mut vm = vm(module);
    vm.set_limits(Limits {
        step_instructions: Some(100),
        frame_depth: None,
    });

    assert!(matches!(
        vm.next_output(None),
        Err(Error::InstructionLimitExceeded(100))
    ));
}

#[test]
fn frame_depth_limit_stops_runaway_calls() {
    let module = Module::new("m", vec![Instruction::call(None, None, false)]);
    let mut vm = vm(module);
    vm.set_limits(Limits {
        step_instructions: None,
        frame_depth: Some(8),
    });

    assert!(matches!(
        vm.next_output(None),
        Err(Error::FrameDepthExceeded(8))
    ));
}

#[test]
fn side_effects_accumulate_until_the_pause() {
    use libretto::{FunctionCall, RoleOperation, RoleOperator, Scene, SceneOperator};

    let call = |function: &str, parameters: &[&str], text: &str| {
        Instruction::statement(
            Node::FunctionCalling(FunctionCall {
                original_text: text.to_string(),
                function: function.to_string(),
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
            }),
            false,
        )
    };
    let module = Module::new(
        "m",
        vec![
            Instruction::statement(
                Node::Scene(Scene {
                    operator: SceneOperator::Add,
                    content: "old.png".to_string(),
                }),
                false,
            ),
            Instruction::statement(
                Node::Scene(Scene {
                    operator: SceneOperator::Add,
                    content: "new.png".to_string(),
                }),
                false,
            ),
            Instruction::statement(
                Node::RoleOperation(RoleOperation {
                    role_name: "alice".to_string(),
                    operator: RoleOperator::Enter,
                    target: "standing".to_string(),
                }),
                false,
            ),
            call("set_flag", &["a", "1"], "@set_flag(a, 1)"),
            call("set_flag", &["b", "2"], "@set_flag(b, 2)"),
            call("play", &["bell"], "@play(bell)"),
            aside("done"),
        ],
    );
    let mut vm = vm(module);

    let out = vm.next_output(None).unwrap().unwrap();
    assert_eq!(
        out.pause_point,
        PausePoint::Aside {
            text: "done".to_string()
        }
    );
    // Latest occurrence wins for singleton fields and per-name entries.
    assert_eq!(out.scene.unwrap().content, "new.png");
    assert_eq!(out.role_operation.unwrap().target, "standing");
    assert_eq!(out.function_callings.len(), 2);
    assert_eq!(
        out.function_callings["set_flag"].parameters,
        vec!["b".to_string(), "2".to_string()]
    );
    assert_eq!(
        out.function_callings["play"].parameters,
        vec!["bell".to_string()]
    );
}

#[test]
fn callback_surface_delivers_the_same_result() {
    let module = Module::new("m", vec![aside("hi")]);
    let mut vm = vm(module);

    let mut seen = None;
    vm.next_output_callback(None, |result| {
        seen = Some(aside_text(result.unwrap()));
    });
    assert_eq!(seen.as_deref(), Some("hi"));
}
