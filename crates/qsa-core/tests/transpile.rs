//! End-to-end transpilation tests

use qsa_core::ast::build_source;
use qsa_core::emit::{emit_source, write_tokens, EmitToken};
use qsa_core::polish::polish;
use qsa_core::{transpile_source, ConvertError, KnownSymbols, Parser, TranspileConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config() -> TranspileConfig {
    TranspileConfig {
        header: Vec::new(),
        ..TranspileConfig::default()
    }
}

fn python(source: &str) -> String {
    transpile_source(source, &config()).unwrap()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{text}"))
}

// ==================== Switch ====================

#[test]
fn switch_fallthrough_runs_cases_in_order() {
    let text = python("switch (x) { case 1: a(); case 2: b(); break; default: c(); }");

    assert!(text.starts_with(
        "_switch_0_value = x\n_switch_0_exec = False\n_switch_0_done = False\n"
    ));
    assert!(text.contains("if _switch_0_exec or not _switch_0_done and _switch_0_value == 1:\n"));
    assert!(text.contains("if _switch_0_exec or not _switch_0_done and _switch_0_value == 2:\n"));

    // case 1 falls into case 2, whose break stops before the default
    let a = position(&text, "    a()\n");
    let b = position(&text, "    b()\n");
    let c = position(&text, "    c()\n");
    assert!(a < b && b < c);
    let stop = position(&text[b..], "    _switch_0_exec = False\n") + b;
    assert!(stop < c);

    assert!(!text.contains("break"));
    assert_eq!(text.lines().filter(|line| line.starts_with("if ")).count(), 3);
}

#[test]
fn break_stops_later_matching_cases() {
    let text = python(
        "switch (true) { case x > 5: a(); break; case x > 2: b(); break; default: c(); }",
    );
    assert!(text.starts_with("_switch_0_value = True\n"));
    // once a case fired, later tests need the done flag to be clear
    assert!(text.contains(
        "if _switch_0_exec or not _switch_0_done and _switch_0_value == (x > 5):\n"
    ));
    assert!(text.contains(
        "if _switch_0_exec or not _switch_0_done and _switch_0_value == (x > 2):\n"
    ));
    assert!(text.contains("if _switch_0_exec or not _switch_0_done:\n"));
}

// ==================== With ====================

#[test]
fn with_routes_calls_through_object() {
    let text = python("function f(cursor) { with (cursor) { setValueBuffer(\"f\", 1); } }");
    assert_eq!(
        text,
        "def f(cursor):\n    _with_obj_0 = cursor\n    _with_obj_0.setValueBuffer(\"f\", 1)\n    \
         del _with_obj_0\n"
    );
}

#[test]
fn sibling_withs_do_not_collide() {
    let text = python(
        "function f(a, b) {\n\
         with (a) { setValueBuffer(\"x\", 1); }\n\
         with (b) { setValueBuffer(\"y\", 2); }\n\
         }",
    );
    assert!(text.contains("_with_obj_0 = a\n"));
    assert!(text.contains("_with_obj_0.setValueBuffer(\"x\", 1)\n"));
    assert!(text.contains("_with_obj_1 = b\n"));
    assert!(text.contains("_with_obj_1.setValueBuffer(\"y\", 2)\n"));
    assert!(position(&text, "del _with_obj_0") < position(&text, "_with_obj_1 = b"));
}

// ==================== Loops ====================

#[test]
fn for_continue_still_increments() {
    let text = python("for (i = 0; i < 3; i++) { if (i == 1) continue; }");
    assert!(text.starts_with("i = 0\nwhile i < 3:\n"));
    assert!(text.contains("    if i == 1:\n        i += 1\n        continue\n"));
    assert!(text.ends_with("    i += 1\n"));
}

#[test]
fn do_while_checks_at_bottom() {
    let text = python("do { f(); } while (g());");
    assert_eq!(text, "while True:\n    f()\n    if not g():\n        break\n");
}

// ==================== Lexical forms ====================

#[test]
fn block_comments_are_skipped() {
    assert_eq!(python("/* x */ a;"), "a\n");
    assert_eq!(
        python("/** @class_declaration interna */\nclass interna {}"),
        "class interna(object):\n    pass\n"
    );
    assert_eq!(python("/*\n * doc\n */\nfunction f() {}"), "def f():\n    pass\n");
}

#[test]
fn legacy_octal_literals() {
    assert_eq!(python("x = 010;"), "x = 0o10\n");
    assert_eq!(python("x = 09;"), "x = 9\n");
}

#[test]
fn length_assignment_truncates() {
    assert_eq!(python("a.length = 0;"), "del a[0:]\n");
    assert_eq!(python("n = a.length;"), "n = len(a)\n");
}

#[test]
fn class_accessors_are_marked_not_fatal() {
    let text = python("class A { function A() {} get x() { return 1; } }");
    assert!(text.contains("class A(object):\n"));
    assert!(text.contains("    def __init__(self):\n"));
    assert!(text.contains("# DEBUG:: "));
}

// ==================== Names ====================

#[test]
fn identifier_mapping() {
    let text = python("var class = 1; var n = null;");
    assert!(text.contains("class_ = 1\n"));
    assert!(text.contains("n = None\n"));

    let text = python("class A { function f() { return this.x; } }");
    assert!(text.contains("return self.x\n"));

    let text = python("var ok = a.startsWith(b);");
    assert_eq!(text, "ok = a.startswith(b)\n");

    let text = python("var $row = $(x);");
    assert_eq!(text, "_S_row = _S_(x)\n");
}

#[test]
fn known_symbols_render_as_host_expressions() {
    let mut known = KnownSymbols::new();
    known.insert(
        "flfactppal".into(),
        "qsa.from_project(\"flfactppal\")".into(),
    );
    let config = TranspileConfig {
        known_symbols: known,
        ..config()
    };
    let text = transpile_source("flfactppal.iface.pub_msg();", &config).unwrap();
    assert_eq!(text, "qsa.from_project(\"flfactppal\").iface.pub_msg()\n");

    // a local declaration shadows the known symbol
    let text = transpile_source("function f(flfactppal) { flfactppal.g(); }", &config).unwrap();
    assert!(text.contains("    flfactppal.g()\n"));
}

// ==================== Errors ====================

#[test]
fn syntax_errors_carry_location() {
    let err = transpile_source("var a = 1;\nif (a {\n", &config()).unwrap_err();
    match err {
        ConvertError::Syntax { location, .. } => assert_eq!(location.line, 2),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn transpilation_is_deterministic() {
    let source = "function f(o) {\n\
                  with (o) { g(); }\n\
                  switch (k) { case \"a\": h(i++); break; default: j(); }\n\
                  for (var n = 0; n < 10; n++) { if (n % 2) continue; m(n); }\n\
                  return function (x) { return x + 1; };\n\
                  }";
    let first = transpile_source(source, &TranspileConfig::default()).unwrap();
    let second = transpile_source(source, &TranspileConfig::default()).unwrap();
    assert_eq!(first, second);
}

// ==================== Block balance ====================

/// Random nested QS statement
fn random_stmt(rng: &mut StdRng, depth: u32, out: &mut String) {
    let choice = if depth == 0 { 0 } else { rng.gen_range(0..9) };
    match choice {
        0 => out.push_str("f(i++);\n"),
        1 => {
            out.push_str("if (a > 1) {\n");
            random_block(rng, depth, out);
            out.push_str("} else {\n");
            random_block(rng, depth, out);
            out.push_str("}\n");
        }
        2 => {
            out.push_str("while (b) {\n");
            random_block(rng, depth, out);
            out.push_str("break;\n}\n");
        }
        3 => {
            out.push_str("for (var k = 0; k < 3; k++) {\n");
            random_block(rng, depth, out);
            out.push_str("continue;\n}\n");
        }
        4 => {
            out.push_str("switch (s) {\ncase 1:\n");
            random_block(rng, depth, out);
            out.push_str("break;\ndefault:\n");
            random_block(rng, depth, out);
            out.push_str("}\n");
        }
        5 => {
            out.push_str("try {\n");
            random_block(rng, depth, out);
            out.push_str("} catch (e) {\n");
            random_block(rng, depth, out);
            out.push_str("}\n");
        }
        6 => {
            out.push_str("with (c) {\n");
            random_block(rng, depth, out);
            out.push_str("}\n");
        }
        7 => {
            out.push_str("do {\n");
            random_block(rng, depth, out);
            out.push_str("} while (d);\n");
        }
        _ => {
            out.push_str("var h = function (x) {\n");
            random_block(rng, depth, out);
            out.push_str("return x;\n};\n");
        }
    }
}

fn random_block(rng: &mut StdRng, depth: u32, out: &mut String) {
    for _ in 0..rng.gen_range(0..3) {
        random_stmt(rng, depth - 1, out);
    }
}

#[test]
fn random_programs_keep_blocks_balanced() {
    let mut rng = StdRng::seed_from_u64(0x5153_4100);
    for _ in 0..64 {
        let mut source = String::from("function main(a, b, c, d, s, i) {\n");
        for _ in 0..rng.gen_range(1..4) {
            random_stmt(&mut rng, 4, &mut source);
        }
        source.push_str("}\n");

        let tree = Parser::parse_source(&source)
            .unwrap_or_else(|errors| panic!("{errors:?} in:\n{source}"));
        let ast = polish(build_source(&tree), &KnownSymbols::new());
        let tokens = emit_source(&ast, &config());

        let mut stack = Vec::new();
        for token in &tokens {
            match token {
                EmitToken::Begin { tag, .. } => stack.push(*tag),
                EmitToken::End(tag) => assert_eq!(stack.pop(), Some(*tag), "in:\n{source}"),
                _ => {}
            }
        }
        assert!(stack.is_empty(), "unclosed blocks in:\n{source}");
        assert!(write_tokens(&tokens, 4).is_ok());
    }
}
