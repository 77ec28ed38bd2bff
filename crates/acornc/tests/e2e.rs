//! End-to-end tests: write an `.acorn` source file, compile it with the
//! real pipeline, run the produced binary, and assert on its exit status
//! and observable output (via `_debug_print_`).

use std::path::PathBuf;
use std::process::Command;

/// Compile a source file and run the resulting binary, returning stdout.
fn compile_and_run(source: &str) -> String {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let main_acorn = temp_dir.path().join("main.acorn");
    std::fs::write(&main_acorn, source).expect("failed to write main.acorn");

    let acornc = find_acornc();
    let output = Command::new(&acornc)
        .args(["build", main_acorn.to_str().unwrap()])
        .output()
        .expect("failed to invoke acornc");

    assert!(
        output.status.success(),
        "acornc build failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let binary = temp_dir.path().join("main");
    let run_output = Command::new(&binary)
        .output()
        .unwrap_or_else(|e| panic!("failed to run binary at {}: {}", binary.display(), e));

    assert!(
        run_output.status.success(),
        "binary exited with {:?}:\nstdout: {}\nstderr: {}",
        run_output.status.code(),
        String::from_utf8_lossy(&run_output.stdout),
        String::from_utf8_lossy(&run_output.stderr)
    );

    String::from_utf8_lossy(&run_output.stdout).to_string()
}

/// Compile a source file expecting failure, returning stderr.
fn compile_expect_error(source: &str) -> String {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let main_acorn = temp_dir.path().join("main.acorn");
    std::fs::write(&main_acorn, source).expect("failed to write main.acorn");

    let acornc = find_acornc();
    let output = Command::new(&acornc)
        .args(["build", main_acorn.to_str().unwrap()])
        .output()
        .expect("failed to invoke acornc");

    assert!(
        !output.status.success(),
        "expected compilation to fail but it succeeded"
    );

    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Find the acornc binary next to the test executable.
fn find_acornc() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    if path.file_name().is_some_and(|n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let acornc = path.join("acornc");
    assert!(
        acornc.exists(),
        "acornc binary not found at {}. Run `cargo build -p acornc` first.",
        acornc.display()
    );
    acornc
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn minimal_empty_program_exits_zero() {
    let stdout = compile_and_run("");
    assert_eq!(stdout, "");
}

#[test]
fn int_variable() {
    let source = "\
let x as Integer64 = 42
_debug_print_(x)
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn int_variable_through_main_definition() {
    let source = "\
let x as Integer64 = 42
def main() as Integer32
    return x as Integer32
end
";
    // The user `main` mangles to its own symbol; the program still runs
    // the emitted entry point and exits 0.
    assert_eq!(compile_and_run(source), "");
}

#[test]
fn single_method() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
_debug_print_(add(2, 3))
";
    assert_eq!(compile_and_run(source), "5\n");
}

#[test]
fn multiple_methods_pick_by_argument_types() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
def add(a as Float64, b as Float64) as Float64
    a + b
end
_debug_print_(add(2, 3))
_debug_print_(to_int(add(1.5, 2.5)))
";
    assert_eq!(compile_and_run(source), "5\n4\n");
}

#[test]
fn basic_generics() {
    let source = "\
def id{T}(x as T) as T
    x
end
_debug_print_(id(7))
_debug_print_(to_int(id(1.5)))
";
    assert_eq!(compile_and_run(source), "7\n1\n");
}

#[test]
fn records() {
    let source = "\
type Point
    x as Integer64
    y as Integer64
end
let p = Point.new(1, 2)
_debug_print_(p.0)
";
    assert_eq!(compile_and_run(source), "1\n");
}

#[test]
fn record_named_fields_and_both_positions() {
    let source = "\
type Pair
    first as Integer64
    second as Integer64
end
let p = Pair.new(10, 20)
_debug_print_(p.first)
_debug_print_(p.1)
";
    assert_eq!(compile_and_run(source), "10\n20\n");
}

#[test]
fn while_loop_counts() {
    let source = "\
let mutable i = 0
while i < 3
    _debug_print_(i)
    i = i + 1
end
";
    assert_eq!(compile_and_run(source), "0\n1\n2\n");
}

#[test]
fn if_branches() {
    let source = "\
let x = 2
if x == 2
    _debug_print_(1)
else
    _debug_print_(0)
end
";
    assert_eq!(compile_and_run(source), "1\n");
}

#[test]
fn keyword_arguments() {
    let source = "\
def sub(a as Integer64, b as Integer64) as Integer64
    a - b
end
_debug_print_(sub(b: 1, a: 10))
";
    assert_eq!(compile_and_run(source), "9\n");
}

#[test]
fn inout_parameter_mutates_caller_storage() {
    let source = "\
def bump(inout x as Integer64) as Integer64
    x = x + 1
end
let mutable value = 41
bump(value)
_debug_print_(value)
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn cast_truncates_width() {
    let source = "\
let wide as Integer64 = 300
_debug_print_(wide as Integer8 as Integer64)
";
    // 300 mod 256 = 44 after truncation to 8 bits.
    assert_eq!(compile_and_run(source), "44\n");
}

#[test]
fn imports_load_before_the_importer() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        temp_dir.path().join("lib.acorn"),
        "def triple(x as Integer64) as Integer64\n    x * 3\nend\n",
    )
    .expect("failed to write lib.acorn");
    std::fs::write(
        temp_dir.path().join("main.acorn"),
        "import \"lib\"\n_debug_print_(triple(7))\n",
    )
    .expect("failed to write main.acorn");

    let acornc = find_acornc();
    let main_acorn = temp_dir.path().join("main.acorn");
    let output = Command::new(&acornc)
        .args(["build", main_acorn.to_str().unwrap()])
        .output()
        .expect("failed to invoke acornc");
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let run_output = Command::new(temp_dir.path().join("main"))
        .output()
        .expect("failed to run binary");
    assert_eq!(String::from_utf8_lossy(&run_output.stdout), "21\n");
}

#[test]
fn generic_function_calling_another_generic() {
    let source = "\
def id{T}(x as T) as T
    x
end
def pass{T}(x as T) as T
    id(x)
end
_debug_print_(pass(5))
";
    assert_eq!(compile_and_run(source), "5\n");
}

#[test]
fn user_operator_overload_extends_the_builtin_set() {
    let source = "\
type Vec
    x as Integer64
    y as Integer64
end
def +(a as Vec, b as Vec) as Vec
    Vec.new(a.x + b.x, a.y + b.y)
end
let v = Vec.new(1, 2) + Vec.new(30, 40)
_debug_print_(v.x)
_debug_print_(v.y)
";
    assert_eq!(compile_and_run(source), "31\n42\n");
}

#[test]
fn module_members_resolve_through_selectors() {
    let source = "\
module Math
    def double(x as Integer64) as Integer64
        x * 2
    end
end
_debug_print_(Math.double(21))
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn division_and_modulo() {
    let source = "\
_debug_print_(7 / 2)
_debug_print_(7 % 2)
";
    assert_eq!(compile_and_run(source), "3\n1\n");
}

#[test]
fn boolean_not_flips_branches() {
    let source = "\
if not(false)
    _debug_print_(1)
else
    _debug_print_(0)
end
";
    assert_eq!(compile_and_run(source), "1\n");
}

#[test]
fn else_if_chain_selects_middle_branch() {
    let source = "\
let x = 2
if x == 1
    _debug_print_(1)
else if x == 2
    _debug_print_(2)
else
    _debug_print_(3)
end
";
    assert_eq!(compile_and_run(source), "2\n");
}

#[test]
fn conversions_round_trip() {
    let source = "\
_debug_print_(to_int(to_float(41) + 1.0))
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn ccall_reaches_libc() {
    // putchar(65) prints 'A'.
    let source = "ccall putchar(Integer32) as Integer32 using 65 as Integer32\n";
    assert_eq!(compile_and_run(source), "A");
}

#[test]
fn tuple_fields_read_by_position() {
    let source = "\
let pair = (40, 2)
_debug_print_(pair.0 + pair.1)
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn generic_record_specialises_per_element_type() {
    let source = "\
type Box{T}
    value as T
end
let a = Box.new(42)
_debug_print_(a.value)
";
    assert_eq!(compile_and_run(source), "42\n");
}

#[test]
fn print_ast_dumps_the_tree() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let main_acorn = temp_dir.path().join("main.acorn");
    std::fs::write(&main_acorn, "let x = 1 + 2\n").expect("failed to write main.acorn");

    let output = Command::new(find_acornc())
        .args(["check", "--print-ast", main_acorn.to_str().unwrap()])
        .output()
        .expect("failed to invoke acornc");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(SourceFile"), "stdout: {stdout}");
    assert!(stdout.contains("(Int 1)"), "stdout: {stdout}");
}

// ── Failure modes ──────────────────────────────────────────────────────

#[test]
fn undefined_name_fails_to_compile() {
    let stderr = compile_expect_error("let x = missing\n");
    assert!(stderr.contains("not defined"), "stderr: {stderr}");
}

#[test]
fn type_mismatch_fails_to_compile() {
    let stderr = compile_expect_error("let x as Boolean = 42\n");
    assert!(stderr.contains("Boolean"), "stderr: {stderr}");
}

#[test]
fn assignment_to_constant_fails_to_compile() {
    let stderr = compile_expect_error("let x = 1\nx = 2\n");
    assert!(stderr.contains("mutable"), "stderr: {stderr}");
}

#[test]
fn check_subcommand_reports_without_building() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let main_acorn = temp_dir.path().join("main.acorn");
    std::fs::write(&main_acorn, "let x = 1\n").expect("failed to write main.acorn");

    let output = Command::new(find_acornc())
        .args(["check", main_acorn.to_str().unwrap()])
        .output()
        .expect("failed to invoke acornc");
    assert!(output.status.success());
    // No binary is produced by check.
    assert!(!temp_dir.path().join("main").exists());
}
