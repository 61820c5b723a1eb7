use super::*;
use crate::memory::organize;
use pins_parser::parse_source;
use pins_seman::resolve;

struct Compiled {
    program: Program,
    layout: Layout,
    generated: Generated,
}

fn compile(src: &str) -> Compiled {
    let program = parse_source(src).expect("front end should succeed");
    let bindings = resolve(&program).expect("names should resolve");
    let layout = organize(&program).expect("layout should succeed");
    let generated = generate(&program, &bindings, &layout).expect("codegen should succeed");
    Compiled {
        program,
        layout,
        generated,
    }
}

fn compile_err(src: &str) -> CodegenError {
    let program = parse_source(src).expect("front end should succeed");
    let bindings = resolve(&program).expect("names should resolve");
    let layout = organize(&program).expect("layout should succeed");
    generate(&program, &bindings, &layout).unwrap_err()
}

fn render<T: std::fmt::Display>(instrs: &[T]) -> Vec<String> {
    instrs.iter().map(ToString::to_string).collect()
}

impl Compiled {
    fn fun_code(&self, full_name: &str) -> Vec<String> {
        let id = self
            .layout
            .frames()
            .find(|(_, f)| f.name == full_name)
            .map(|(id, _)| id)
            .expect("function present");
        render(self.generated.code(id).expect("function code"))
    }

    fn var_id(&self, short_name: &str) -> NodeId {
        self.layout
            .accesses()
            .find(|(_, a)| match a {
                Access::Abs(abs) => abs.name == short_name,
                Access::Rel(rel) => rel.name == short_name && rel.offset < 0,
            })
            .map(|(id, _)| id)
            .expect("variable present")
    }
}

#[test]
fn addition_statement_in_main() {
    let c = compile("fun main() = 1 + 2");
    assert_eq!(
        c.fun_code("main"),
        vec!["main:", "PUSH 1", "PUSH 2", "OPER ADD", "PUSH 4", "POPN", "PUSH 0", "RETN main"]
    );
}

#[test]
fn local_variable_is_initialized_and_read() {
    let c = compile("fun main() = let var x = 5 in x end");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", "PUSH -4", "POPN", "REGN FP", "PUSH -12", "OPER ADD", "NAME :0", "INIT", "REGN FP",
            "PUSH -12", "OPER ADD", "LOAD", "PUSH 4", "POPN", "PUSH 0", "RETN main",
        ]
    );
    let data = c.generated.data(c.var_id("x")).expect("payload");
    assert_eq!(render(data), vec![":0:", "DATA 1", "DATA 1", "DATA 1", "DATA 5"]);
}

#[test]
fn global_variable_code_and_data() {
    let c = compile("var g = 3 fun main() = g");
    let id = c.var_id("g");
    assert_eq!(render(c.generated.code(id).expect("init code")), vec!["NAME g", "NAME :0", "INIT"]);
    assert_eq!(
        render(c.generated.data(id).expect("data")),
        vec!["g:", "SIZE 4", ":0:", "DATA 1", "DATA 1", "DATA 1", "DATA 3"]
    );
    assert_eq!(
        c.fun_code("main"),
        vec!["main:", "NAME g", "LOAD", "PUSH 4", "POPN", "PUSH 0", "RETN main"]
    );
}

#[test]
fn parameter_return_pops_arguments() {
    let c = compile("fun f(a, b) = a - b fun main() = f(1, 2)");
    assert_eq!(
        c.fun_code("f"),
        vec![
            "f:", "REGN FP", "PUSH 4", "OPER ADD", "LOAD", "REGN FP", "PUSH 8", "OPER ADD", "LOAD",
            "OPER SUB", "PUSH 4", "POPN", "PUSH 8", "RETN f",
        ]
    );
}

#[test]
fn call_arguments_are_pushed_right_to_left() {
    let c = compile("fun f(a, b) fun main() = f(1, 2)");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", "PUSH 2", "PUSH 1", "REGN FP", "LOAD", "NAME f", "CALL f", "PUSH 4", "POPN",
            "PUSH 0", "RETN main",
        ]
    );
}

#[test]
fn bodiless_function_has_no_code() {
    let c = compile("fun putint(n) fun main() = putint(1)");
    let id = c.layout.frames().find(|(_, f)| f.name == "putint").map(|(id, _)| id);
    assert!(c.generated.code(id.expect("frame")).is_none());
}

#[test]
fn nested_callee_gets_callers_frame_pointer() {
    let c = compile("fun f() = let fun g() = 1 in g() end");
    assert_eq!(
        c.fun_code("f"),
        vec!["f:", "REGN FP", "NAME f.g", "CALL f.g", "PUSH 4", "POPN", "PUSH 0", "RETN f"]
    );
    assert_eq!(c.fun_code("f.g"), vec!["f.g:", "PUSH 1", "PUSH 4", "POPN", "PUSH 0", "RETN f.g"]);
}

#[test]
fn recursive_call_follows_one_static_link() {
    let c = compile("fun f(n) = f(n)");
    assert_eq!(
        c.fun_code("f"),
        vec![
            "f:", "REGN FP", "PUSH 4", "OPER ADD", "LOAD", "REGN FP", "LOAD", "NAME f", "CALL f", "PUSH 4",
            "POPN", "PUSH 4", "RETN f",
        ]
    );
}

#[test]
fn sibling_call_from_nested_function_walks_out() {
    let c = compile("fun f() = let fun g() = 1 fun h() = g() in h() end");
    // h and g both sit at depth 2; g's static link is h's static link
    assert_eq!(
        c.fun_code("f.h"),
        vec!["f.h:", "REGN FP", "LOAD", "NAME f.g", "CALL f.g", "PUSH 4", "POPN", "PUSH 0", "RETN f.h"]
    );
}

#[test]
fn outer_variable_read_through_static_link() {
    let c = compile("fun f(x) = let fun g() = x in g() end");
    assert_eq!(
        c.fun_code("f.g"),
        vec!["f.g:", "REGN FP", "LOAD", "PUSH 4", "OPER ADD", "LOAD", "PUSH 4", "POPN", "PUSH 0", "RETN f.g"]
    );
}

#[test]
fn calls_target_disambiguated_names() {
    let c = compile("fun main() = let fun h() = 1 in h() end, let fun h() = 2 in h() end");
    let main = c.fun_code("main");
    assert!(main.contains(&"CALL main.h".to_string()), "{main:?}");
    assert!(main.contains(&"CALL main.h:1".to_string()), "{main:?}");
    assert_eq!(c.fun_code("main.h:1")[0], "main.h:1:");
}

#[test]
fn if_else_layout() {
    let c = compile("fun main() = if 1 then 2 else 3 end");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", "PUSH 1", "NAME :then:0", "NAME :else:0", "CJMP", ":then:0:", "PUSH 2", "PUSH 4", "POPN",
            "NAME :endif:0", "UJMP", ":else:0:", "PUSH 3", "PUSH 4", "POPN", ":endif:0:", "PUSH 0", "RETN main",
        ]
    );
}

#[test]
fn while_layout() {
    let c = compile("fun main() = while 0 do 1 end");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", ":while:0:", "PUSH 0", "NAME :do:0", "NAME :endwhile:0", "CJMP", ":do:0:", "PUSH 1",
            "PUSH 4", "POPN", "NAME :while:0", "UJMP", ":endwhile:0:", "PUSH 0", "RETN main",
        ]
    );
}

#[test]
fn control_flow_labels_never_repeat() {
    let c = compile(
        "fun f() = if 1 then 2 end, while 0 do 1 end \
         fun main() = if 1 then while 0 do 1 end end, let fun f() = if 1 then 1 end in f() end",
    );
    let mut labels: Vec<String> = c
        .layout
        .frames()
        .filter_map(|(id, _)| c.generated.code(id))
        .flat_map(|code| code.iter())
        .filter(|i| i.is_label())
        .map(ToString::to_string)
        .collect();
    let total = labels.len();
    labels.sort();
    labels.dedup();
    assert_eq!(labels.len(), total, "{labels:?}");
}

#[test]
fn assignment_to_variable() {
    let c = compile("var g = fun main() = g = 7");
    assert_eq!(c.fun_code("main"), vec!["main:", "PUSH 7", "NAME g", "SAVE", "PUSH 0", "RETN main"]);
}

#[test]
fn assignment_through_pointer() {
    let c = compile("fun main() = let var p = 0 in p^ = 5 end");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", "PUSH -4", "POPN", "REGN FP", "PUSH -12", "OPER ADD", "NAME :0", "INIT", "PUSH 5",
            "REGN FP", "PUSH -12", "OPER ADD", "LOAD", "SAVE", "PUSH 0", "RETN main",
        ]
    );
}

#[test]
fn assignment_to_constant_is_malformed() {
    let err = compile_err("fun main() = 1 = 2");
    assert!(matches!(err, CodegenError::MalformedLvalue { .. }), "{err}");
}

#[test]
fn address_of_non_variable_is_malformed() {
    let err = compile_err("fun main() = ^(1 + 2)");
    assert!(matches!(err, CodegenError::MalformedLvalue { .. }), "{err}");
}

#[test]
fn address_of_local() {
    let c = compile("fun main() = let var x = 1 in ^x end");
    let main = c.fun_code("main");
    assert_eq!(&main[8..13], &["REGN FP", "PUSH -12", "OPER ADD", "PUSH 4", "POPN"]);
}

#[test]
fn unary_operators() {
    let c = compile("fun main() = -1, !0, +2");
    assert_eq!(
        c.fun_code("main"),
        vec![
            "main:", "PUSH 1", "OPER NEG", "PUSH 4", "POPN", "PUSH 0", "OPER NOT", "PUSH 4", "POPN", "PUSH 2",
            "PUSH 4", "POPN", "PUSH 0", "RETN main",
        ]
    );
}

#[test]
fn comparison_and_logic_operators() {
    let c = compile("fun main() = 1 <= 2 && 3 != 4");
    assert_eq!(
        &c.fun_code("main")[1..8],
        &["PUSH 1", "PUSH 2", "OPER LEQ", "PUSH 3", "PUSH 4", "OPER NEQ", "OPER AND"]
    );
}

#[test]
fn string_literal_gets_data_label() {
    let c = compile(r#"fun main() = "hi""#);
    assert_eq!(c.fun_code("main")[1], "NAME :str:0");
    let expr_id = match &c.program.definitions[0] {
        Definition::Fun(f) => match &f.body[0] {
            Statement::Expr(e) => e.id,
            other => panic!("expected expression statement, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    };
    assert_eq!(
        render(c.generated.data(expr_id).expect("string data")),
        vec![":str:0:", "DATA 104", "DATA 105", "DATA 0"]
    );
}

#[test]
fn character_constant_pushes_code() {
    let c = compile(r"fun main() = '\n'");
    assert_eq!(c.fun_code("main")[1], "PUSH 10");
}

#[test]
fn strip_only_drops_zero_discard() {
    let span = Span::default();
    let mut zero = vec![
        CodeInstr::new(CodeKind::Push(1), span),
        CodeInstr::new(CodeKind::Push(0), span),
        CodeInstr::new(CodeKind::Popn, span),
    ];
    strip_dead_discard(&mut zero);
    assert_eq!(render(&zero), vec!["PUSH 1"]);

    let mut four = vec![CodeInstr::new(CodeKind::Push(4), span), CodeInstr::new(CodeKind::Popn, span)];
    strip_dead_discard(&mut four);
    assert_eq!(four.len(), 2);
}

#[test]
fn call_into_deeper_nesting_is_not_visible() {
    let program = parse_source(
        "fun main() = f()\nfun f() = let fun g() = let fun h() = 1 in h() end in g() end",
    )
    .expect("front end should succeed");
    let layout = organize(&program).expect("layout should succeed");
    let call = match &program.definitions[0] {
        Definition::Fun(main) => match &main.body[0] {
            Statement::Expr(e) => e.id,
            other => panic!("expected expression statement, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    };
    let h = layout
        .frames()
        .find(|(_, f)| f.name == "f.g.h")
        .map(|(id, _)| id)
        .expect("frame of h");
    // main (depth 1) may only reach callees up to depth 2; h is at depth 3
    let bindings: Bindings = [(call, Decl::Fun(h))].into_iter().collect();

    let err = generate(&program, &bindings, &layout).unwrap_err();
    match err {
        CodegenError::NotVisible { name, caller, line, column } => {
            assert_eq!((name.as_str(), caller.as_str()), ("f.g.h", "main"));
            assert_eq!((line, column), (1, 14));
        }
        other => panic!("expected NotVisible, got {other}"),
    }
}
