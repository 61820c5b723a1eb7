use super::*;
use pins_parser::parse_source;

fn program(src: &str) -> Program {
    parse_source(src).expect("front end should succeed")
}

fn layout_of(prog: &Program) -> Layout {
    organize(prog).expect("layout should succeed")
}

/// Find a definition anywhere in the tree by name (first match, preorder).
fn find_def<'a>(prog: &'a Program, name: &str) -> &'a Definition {
    fn in_stmts<'a>(stmts: &'a [Statement], name: &str) -> Option<&'a Definition> {
        stmts.iter().find_map(|s| match s {
            Statement::Let { defs, body, .. } => {
                in_defs(defs, name).or_else(|| in_stmts(body, name))
            }
            Statement::If { then_body, else_body, .. } => {
                in_stmts(then_body, name).or_else(|| in_stmts(else_body, name))
            }
            Statement::While { body, .. } => in_stmts(body, name),
            _ => None,
        })
    }
    fn in_defs<'a>(defs: &'a [Definition], name: &str) -> Option<&'a Definition> {
        defs.iter().find_map(|d| {
            if d.name() == name {
                return Some(d);
            }
            match d {
                Definition::Fun(f) => in_stmts(&f.body, name),
                Definition::Var(_) => None,
            }
        })
    }
    in_defs(&prog.definitions, name).expect("definition present")
}

fn frame<'a>(layout: &'a Layout, prog: &Program, name: &str) -> &'a Frame {
    layout.frame(find_def(prog, name).id()).expect("frame present")
}

fn rel(layout: &Layout, prog: &Program, name: &str) -> RelAccess {
    match layout.access(find_def(prog, name).id()) {
        Some(Access::Rel(r)) => r.clone(),
        other => panic!("expected relative access for {name}, got {other:?}"),
    }
}

#[test]
fn global_variable_is_absolute() {
    let prog = program("var g = 3 fun main() = g");
    let layout = layout_of(&prog);
    match layout.access(find_def(&prog, "g").id()) {
        Some(Access::Abs(a)) => {
            assert_eq!(a.name, "g");
            assert_eq!(a.size, 4);
            assert_eq!(a.inits.as_ref().map(|i| i.words().to_vec()), Some(vec![1, 1, 1, 3]));
        }
        other => panic!("expected absolute access, got {other:?}"),
    }
}

#[test]
fn first_local_sits_below_header() {
    let prog = program("fun main() = let var x = 5 in x end");
    let layout = layout_of(&prog);
    let x = rel(&layout, &prog, "x");
    assert_eq!(x.offset, -12);
    assert_eq!(x.depth, 1);
    assert_eq!(x.size, 4);
    assert_eq!(frame(&layout, &prog, "main").vars_size, 12);
}

#[test]
fn parameters_count_up_from_static_link() {
    let prog = program("fun f(a, b, c) = a");
    let layout = layout_of(&prog);
    let f = match &prog.definitions[0] {
        Definition::Fun(f) => f,
        _ => panic!("expected fun"),
    };
    let offsets: Vec<i32> = f
        .params
        .iter()
        .map(|p| match layout.access(p.id) {
            Some(Access::Rel(r)) => r.offset,
            other => panic!("expected relative access, got {other:?}"),
        })
        .collect();
    assert_eq!(offsets, vec![4, 8, 12]);
    let fr = frame(&layout, &prog, "f");
    assert_eq!(fr.pars_size, 16);
    assert_eq!(fr.vars_size, 8);
    assert_eq!(fr.depth, 1);
}

#[test]
fn array_and_string_sizes() {
    let prog = program(r#"fun main() = let var a = 10 * 0 var s = "ab" var t = 2 * "xyz", 'c' in a end"#);
    let layout = layout_of(&prog);
    let a = rel(&layout, &prog, "a");
    let s = rel(&layout, &prog, "s");
    let t = rel(&layout, &prog, "t");
    assert_eq!(a.size, 40);
    assert_eq!(a.offset, -48);
    assert_eq!(s.size, 12);
    assert_eq!(s.offset, -60);
    // 2 * 4 bytes per char * 4 chars (terminator included) + 4
    assert_eq!(t.size, 36);
    assert_eq!(t.offset, -96);
    assert_eq!(frame(&layout, &prog, "main").vars_size, 96);
    assert_eq!(
        t.inits.as_ref().map(|i| i.words().to_vec()),
        Some(vec![2, 2, 4, 120, 121, 122, 0, 1, 1, 99])
    );
}

#[test]
fn uninitialized_variable_is_one_zero_word() {
    let prog = program("var g = fun main() = g");
    let layout = layout_of(&prog);
    let access = layout.access(find_def(&prog, "g").id()).expect("access");
    assert_eq!(access.size(), 4);
    assert_eq!(access.inits(), Some(&Inits::zero()));
}

#[test]
fn nested_let_locals_share_function_frame() {
    let prog = program("fun f() = let var a = 1 in let var b = 2 in a + b end, let var c = 3 in c end end");
    let layout = layout_of(&prog);
    let (a, b, c) = (rel(&layout, &prog, "a"), rel(&layout, &prog, "b"), rel(&layout, &prog, "c"));
    assert_eq!((a.offset, b.offset, c.offset), (-12, -16, -20));
    assert_eq!((a.depth, b.depth, c.depth), (1, 1, 1));
    assert_eq!(frame(&layout, &prog, "f").vars_size, 20);
}

#[test]
fn nested_functions_are_deeper_and_qualified() {
    let prog = program(
        "fun f(x) = let fun g(y) = let fun h() = x + y in h() end in g(1) end",
    );
    let layout = layout_of(&prog);
    let f = frame(&layout, &prog, "f");
    let g = frame(&layout, &prog, "g");
    let h = frame(&layout, &prog, "h");
    assert_eq!((f.name.as_str(), f.depth), ("f", 1));
    assert_eq!((g.name.as_str(), g.depth), ("f.g", 2));
    assert_eq!((h.name.as_str(), h.depth), ("f.g.h", 3));

    let y = match find_def(&prog, "g") {
        Definition::Fun(g) => g.params[0].id,
        other => panic!("expected fun, got {other:?}"),
    };
    match layout.access(y) {
        Some(Access::Rel(r)) => assert_eq!((r.depth, r.offset), (2, 4)),
        other => panic!("expected relative access for y, got {other:?}"),
    }
}

#[test]
fn sibling_functions_with_same_name_get_suffixes() {
    let prog = program(
        "fun main() = let fun h() = 1 in h() end, let fun h() = 2 in h() end, let fun h() = 3 in h() end",
    );
    let layout = layout_of(&prog);
    let names: Vec<&str> = layout.frames().map(|(_, f)| f.name.as_str()).collect();
    assert_eq!(names, vec!["main.h", "main.h:1", "main.h:2", "main"]);
}

#[test]
fn bodiless_function_has_frame() {
    let prog = program("fun putint(n) fun main() = putint(1)");
    let layout = layout_of(&prog);
    let fr = frame(&layout, &prog, "putint");
    assert_eq!(fr.pars_size, 8);
    assert_eq!(fr.vars_size, 8);
}

#[test]
fn zero_repeat_is_illegal() {
    let prog = program("var a = 0 * 5 fun main() = a");
    let err = organize(&prog).unwrap_err();
    assert!(matches!(err, CodegenError::IllegalConstant { .. }), "{err}");
}

#[test]
fn integer_overflow_is_illegal() {
    let prog = program("var a = 99999999999 fun main() = a");
    let err = organize(&prog).unwrap_err();
    assert!(err.to_string().contains("does not fit"), "{err}");
}

#[test]
fn frame_sizes_are_word_aligned() {
    let prog = program(
        r#"
var buf = 100 * 0
fun putint(n)
fun main() =
    let
        var s = "odd"
        var k = 3 * 'x'
        fun helper(a, b) = let var t = 1 in a + b + t end
    in
        helper(1, 2)
    end
"#,
    );
    let layout = layout_of(&prog);
    for (_, fr) in layout.frames() {
        assert!(fr.vars_size >= FRAME_HEADER && fr.vars_size % 4 == 0, "{fr}");
        assert!(fr.pars_size >= STATIC_LINK && fr.pars_size % 4 == 0, "{fr}");
    }
    for (_, access) in layout.accesses() {
        assert_eq!(access.size() % 4, 0, "{access}");
    }
}

#[test]
fn inits_display_truncates() {
    let prog = program(r#"var s = "hello world!" fun main() = s"#);
    let layout = layout_of(&prog);
    let access = layout.access(find_def(&prog, "s").id()).expect("access");
    assert_eq!(
        access.to_string(),
        "size=52 inits=104,101,108,108,111,32,119,111,114,108..."
    );
}

#[test]
fn inits_values_expand_repeats() {
    let prog = program("var a = 3 * 7, 2 * 'a' fun main() = a");
    let layout = layout_of(&prog);
    let inits = layout.access(find_def(&prog, "a").id()).and_then(Access::inits).expect("inits");
    assert_eq!(inits.values(), vec![7, 7, 7, 97, 97]);
}

#[test]
fn layout_report_lists_everything() {
    let prog = program("var g = 1 fun f(p) = let var v = 2 fun k() = p in k() end");
    let layout = layout_of(&prog);
    let text = report(&prog, &layout);
    assert_eq!(
        text,
        "var g size=4 inits=1\n\
         fun f depth=1 parsSize=8 varsSize=12\n\
         \x20 par p offset=4 size=4 depth=1\n\
         \x20 var v offset=-12 size=4 depth=1 inits=2\n\
         \x20 fun f.k depth=2 parsSize=4 varsSize=8\n"
    );
}
