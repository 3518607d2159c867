mod environment;
mod error;
mod evaluator;
mod helpers;
mod interpreter;
mod modules;
pub mod value;

pub use environment::Environment;
pub use error::{caveman, EvalError, Oops};
pub use helpers::Helper;
pub use interpreter::{Flow, Interpreter};
pub use value::Value;

use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;

/// Run a program headlessly and collect its output lines. Each program run
/// gets its own interpreter instance rooted at `base_path`.
pub fn run_to_lines(source: &str, base_path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    let mut interpreter = Interpreter::new(
        base_path,
        Box::new(move |line: &str| sink.borrow_mut().push(line.to_string())),
    )?;
    interpreter.run(source);
    drop(interpreter);
    Ok(Rc::try_unwrap(lines)
        .map(RefCell::into_inner)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::run_to_lines;

    fn run(source: &str) -> Vec<String> {
        let dir = tempfile::tempdir().unwrap();
        run_to_lines(source, dir.path()).unwrap()
    }

    #[test]
    fn say_yell_whisper() {
        let source = "say hello world\nyell quiet down\nwhisper LOUD NOISES";
        assert_eq!(
            run(source),
            vec![
                "hello world".to_string(),
                "QUIET DOWN!!!".to_string(),
                "loud noises".to_string(),
            ]
        );
    }

    #[test]
    fn assignment_then_arithmetic() {
        let source = "let x = 2\nuhmath x = x + 3\nsay x";
        assert_eq!(run(source), vec!["5".to_string()]);
    }

    #[test]
    fn string_interpolation_in_say() {
        let source = "let name = \"world\"\nsay \"hi $name\"";
        assert_eq!(run(source), vec!["hi world".to_string()]);
    }

    #[test]
    fn unresolvable_let_keeps_raw_text() {
        let source = "let mood = very happy indeed\nsay mood";
        assert_eq!(run(source), vec!["very happy indeed".to_string()]);
    }

    #[test]
    fn function_call_result_capture() {
        let source = "do_thing add a b:\n    giveback a + b\nlet r = yo add 2 3\nsay r";
        assert_eq!(run(source), vec!["5".to_string()]);
    }

    #[test]
    fn missing_arguments_become_nil() {
        let source = "do_thing shout a b:\n    say a\n    say b\nyo shout only";
        assert_eq!(run(source), vec!["only".to_string(), "nil".to_string()]);
    }

    #[test]
    fn callee_writes_do_not_leak_to_caller() {
        let source = "let x = 1\ndo_thing bump:\n    let x = 99\nyo bump\nsay x";
        assert_eq!(run(source), vec!["1".to_string()]);
    }

    #[test]
    fn class_definition_and_init_property() {
        let source = "thingy Counter:\n    do_thing init self start:\n        self.n = start\nlet c = new Counter 10\nsay c.n";
        assert_eq!(
            run(source),
            vec![
                "[thingy] defined class 'Counter' with methods: ['init']".to_string(),
                "10".to_string(),
            ]
        );
    }

    #[test]
    fn method_calls_mutate_shared_properties() {
        let source = "thingy Counter:\n    do_thing init self start:\n        self.n = start\n    do_thing bump self:\n        self.n = self.n + 1\nlet c = new Counter 10\nyo c.bump\nyo c.bump\nsay c.n";
        let lines = run(source);
        assert_eq!(lines.last(), Some(&"12".to_string()));
    }

    #[test]
    fn class_without_init_stores_ordinal_args() {
        let source = "thingy Bag:\n    do_thing poke self:\n        say poked\nlet b = new Bag 7 8\nsay b.arg0\nsay b.arg1";
        let lines = run(source);
        assert_eq!(&lines[1..], &["7".to_string(), "8".to_string()][..]);
    }

    #[test]
    fn conditional_chain_runs_first_true_branch_only() {
        let source = "let x = 2\nmaybeif x == 1:\n    say one\normaybe x == 2:\n    say two\normaybe x == 2:\n    say again\notherwise:\n    say other";
        assert_eq!(run(source), vec!["two".to_string()]);
    }

    #[test]
    fn conditional_falls_through_to_otherwise() {
        let source = "let x = 9\nmaybeif x == 1:\n    say one\notherwise:\n    say other";
        assert_eq!(run(source), vec!["other".to_string()]);
    }

    #[test]
    fn counted_loop_binds_each_value() {
        let source = "dosomany i in 1 to 3:\n    say \"$i\"";
        assert_eq!(
            run(source),
            vec!["1".to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[test]
    fn counted_loop_with_bad_bounds_is_empty() {
        let source = "dosomany i in frog to 3:\n    say \"$i\"\nsay done";
        assert_eq!(run(source), vec!["done".to_string()]);
    }

    #[test]
    fn repeatuntil_runs_until_condition_holds() {
        let source = "let n = 0\nrepeatuntil n == 3:\n    uhmath n = n + 1\nsay n";
        assert_eq!(run(source), vec!["3".to_string()]);
    }

    #[test]
    fn loop_ceiling_reports_instead_of_hanging() {
        let source = "loopforever:\n    let x = 1";
        assert_eq!(
            run(source),
            vec!["[oops] brain hurt line 1: infinite loop detected".to_string()]
        );
    }

    #[test]
    fn absurd_wait_is_reported_and_skipped() {
        let source = "wait 1e300\nsay survived";
        assert_eq!(
            run(source),
            vec![
                "[oops] brain hurt line 1: wait wants seconds — 1e300".to_string(),
                "survived".to_string(),
            ]
        );
    }

    #[test]
    fn runaway_recursion_reports_instead_of_aborting() {
        let source = "do_thing f:\n    yo f\nyo f";
        assert_eq!(
            run(source),
            vec!["[oops] brain hurt: too much recursion".to_string()]
        );
    }

    #[test]
    fn recursion_ceiling_is_catchable_and_resets() {
        let source = "do_thing f:\n    yo f\ndo_thing g:\n    giveback 7\n\
                      try:\n    yo f\ncatch e:\n    say e\nlet r = yo g\nsay r";
        assert_eq!(
            run(source),
            vec!["[oops] too much recursion".to_string(), "7".to_string()]
        );
    }

    #[test]
    fn caught_exception_binds_its_message() {
        let source = "try:\n    oops \"x\"\ncatch e:\n    say e\nsay after";
        let lines = run(source);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("x"), "line was: {}", lines[0]);
        assert_eq!(lines[1], "after");
    }

    #[test]
    fn uncaught_exception_stops_the_program() {
        let source = "say before\ntry:\n    oops \"x\"\nsay never";
        assert_eq!(
            run(source),
            vec![
                "before".to_string(),
                "[oops] brain hurt line 3: x".to_string(),
            ]
        );
    }

    #[test]
    fn oops_block_form_raises_after_children() {
        let source = "try:\n    oops:\n        say working on it\ncatch e:\n    say e";
        let lines = run(source);
        assert_eq!(lines[0], "working on it");
        assert!(lines[1].contains("oop happened"), "line was: {}", lines[1]);
    }

    #[test]
    fn unknown_command_is_reported_and_skipped() {
        let source = "frobnicate the widget\nsay next";
        let lines = run(source);
        assert!(
            lines[0].contains("me no know command"),
            "line was: {}",
            lines[0]
        );
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn ragequit_stops_everything() {
        let source = "say a\nragequit\nsay b";
        assert_eq!(
            run(source),
            vec!["a".to_string(), "ragequitting... 😡".to_string()]
        );
    }

    #[test]
    fn listvars_dumps_scope_sorted() {
        let source = "let b = 2\nlet a = 1\nlistvars";
        assert_eq!(run(source), vec!["a = 1".to_string(), "b = 2".to_string()]);
    }

    #[test]
    fn trashmath_is_confidently_wrong() {
        let lines = run("trashmath 2 + 2");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("2 + 2 = "));
        assert!(lines[0].ends_with("(probably wrong)"));
    }

    #[test]
    fn scribble_and_fetch_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = "let name = zed\nscribble notes.txt with \"hello $name\"\nfetch notes.txt into data\nsay data";
        let lines = run_to_lines(source, dir.path()).unwrap();
        assert!(lines[0].starts_with("[scribble] wrote "));
        assert!(lines[1].starts_with("[fetch] "));
        assert_eq!(lines[2], "hello zed");
        let on_disk = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(on_disk, "hello zed");
    }

    #[test]
    fn scribblemore_appends() {
        let dir = tempfile::tempdir().unwrap();
        let source = "scribble log.txt with \"a\"\nscribblemore log.txt with \"b\"";
        run_to_lines(source, dir.path()).unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(on_disk, "ab");
    }

    #[test]
    fn fetch_failure_leaves_empty_string() {
        let source = "fetch nope.txt into data\nsay done";
        let lines = run(source);
        assert!(lines[0].contains("fetch fail"), "line was: {}", lines[0]);
        assert_eq!(lines[1], "done");
    }

    #[test]
    fn steal_runs_a_module_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        std::fs::write(
            dir.path().join("modules").join("greet.langlowiq"),
            "say hi from module\n",
        )
        .unwrap();

        let source = "steal greet\nsteal greet";
        let lines = run_to_lines(source, dir.path()).unwrap();
        assert_eq!(
            lines,
            vec![
                "hi from module".to_string(),
                "[steal] greet loaded".to_string(),
                "[steal] greet already loaded".to_string(),
            ]
        );
    }

    #[test]
    fn missing_module_is_soft_failure() {
        let source = "steal missing_module\nsay next";
        let lines = run(source);
        assert!(
            lines[0].contains("missing_module not found to steal"),
            "line was: {}",
            lines[0]
        );
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn builtin_libs_are_bootstrapped_and_loadable() {
        let source = "steal dumbmath\nlet r = yo dumbadd 2 3\nsay r";
        let lines = run(source);
        assert!(lines.contains(&"[steal] dumbmath loaded".to_string()));
        assert_eq!(lines.last(), Some(&"5".to_string()));
    }

    #[test]
    fn helpers_are_callable_as_functions() {
        let source = "let r = yo smash \"a\" \"b\"\nsay r";
        assert_eq!(run(source), vec!["ab".to_string()]);
    }

    #[test]
    fn random_binds_within_range() {
        let source = "random n 1 to 3\nmaybeif n < 1:\n    say low\normaybe n > 3:\n    say high\notherwise:\n    say ok";
        assert_eq!(run(source), vec!["ok".to_string()]);
    }

    #[test]
    fn comments_are_no_ops() {
        let source = "# a comment\nsay visible";
        assert_eq!(run(source), vec!["visible".to_string()]);
    }
}
