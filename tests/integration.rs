use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use minishell::exec::stage::command_words;
use minishell::parse::{ArgVector, classify, tokenize};

const BIN: &str = env!("CARGO_BIN_EXE_minishell");

// ── Line classification ──

fn shape_for(line: &str) -> (bool, Option<usize>) {
    let shape = classify(&tokenize(line));
    (shape.pipeline, shape.redirection)
}

macro_rules! shape_test {
    ($name:ident, $line:expr, pipeline: $pipe:expr, redirect: $redir:expr) => {
        #[test]
        fn $name() {
            assert_eq!(shape_for($line), ($pipe, $redir), "line: {}", $line);
        }
    };
}

shape_test!(shape_plain, "ls -la /tmp", pipeline: false, redirect: None);
shape_test!(shape_pipe_left, "echo hi |", pipeline: true, redirect: None);
shape_test!(shape_pipe_left_no_args, "ls |", pipeline: true, redirect: None);
shape_test!(shape_lone_pipe, "|", pipeline: false, redirect: None);
shape_test!(shape_pipe_same_line, "echo hi | cat", pipeline: false, redirect: None);
shape_test!(shape_redirect, "ls > out.txt", pipeline: false, redirect: Some(2));
shape_test!(shape_redirect_args, "echo a b > f", pipeline: false, redirect: Some(4));
shape_test!(shape_redirect_no_command, "> f", pipeline: false, redirect: None);
shape_test!(shape_redirect_mid_line, "echo > f more", pipeline: false, redirect: None);
shape_test!(shape_redirect_then_pipe, "echo hi > f |", pipeline: true, redirect: None);
shape_test!(shape_append_unsupported, "echo hi >> f", pipeline: false, redirect: None);
shape_test!(shape_extra_spaces, "  ls   >   out  ", pipeline: false, redirect: Some(2));

#[test]
fn tokenize_counts_words() {
    let argv = tokenize("ls -la /tmp");
    assert_eq!(argv, ArgVector::new(["ls", "-la", "/tmp"]));
    assert_eq!(argv.len(), 3);
}

#[test]
fn redirected_command_words() {
    let argv = tokenize("ls > out.txt");
    assert_eq!(command_words(&argv, classify(&argv)), ArgVector::new(["ls"]));
}

#[test]
fn staged_left_side_drops_pipe() {
    let staged = tokenize("echo hello |").without_trailing_pipe();
    assert_eq!(staged, ArgVector::new(["echo", "hello"]));
}

// ── Whole sessions through the binary ──

/// A scratch `$HOME`, so no user config is read and the log stays local.
fn scratch_home() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn write_overlay(home: &Path, toml: &str) {
    let dir = home.join(".config/minishell");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), toml).unwrap();
}

/// The binary with `$HOME` and the working directory both set to `home`.
fn shell_command(home: &Path) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env("HOME", home)
        .current_dir(home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn feed(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd.spawn().expect("spawn minishell");
    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().expect("wait minishell")
}

fn shell_in(home: &Path, input: &str) -> Output {
    feed(shell_command(home), input.as_bytes())
}

fn shell(input: &str) -> Output {
    let home = scratch_home();
    shell_in(home.path(), input)
}

fn stdout_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn exit_keyword_succeeds() {
    let out = shell("exit\n");
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "$ ");
}

#[test]
fn end_of_input_succeeds() {
    let out = shell("");
    assert!(out.status.success());
}

#[test]
fn runs_simple_command() {
    let out = shell("echo hello\nexit\n");
    assert!(out.status.success());
    assert!(stdout_of(&out).contains("hello\n"));
}

#[test]
fn prompt_before_every_line() {
    let out = shell("\n\nexit\n");
    assert_eq!(stdout_of(&out), "$ $ $ ");
}

#[test]
fn quotes_are_plain_characters() {
    let out = shell("echo \"a b\"\nexit\n");
    assert!(stdout_of(&out).contains("\"a b\"\n"));
}

#[test]
fn single_line_pipe_is_passed_as_arguments() {
    let out = shell("echo a | b\nexit\n");
    assert!(stdout_of(&out).contains("a | b\n"));
}

#[test]
fn pipeline_round_trip() {
    let out = shell("echo hello |\ncat\nexit\n");
    assert!(out.status.success());
    assert!(stdout_of(&out).contains("hello\n"), "stdout: {}", stdout_of(&out));
}

#[test]
fn left_hand_line_alone_prints_nothing() {
    let out = shell("echo hidden |\nexit\n");
    assert!(out.status.success());
    assert!(!stdout_of(&out).contains("hidden"));
}

#[test]
fn session_survives_pipeline() {
    let out = shell("echo one |\ncat\necho two\nexit\n");
    let stdout = stdout_of(&out);
    assert!(stdout.contains("one\n"));
    assert!(stdout.contains("two\n"));
}

#[test]
fn consecutive_pipelines_get_fresh_pipe() {
    let out = shell("echo first |\ncat\necho second |\ncat\nexit\n");
    let stdout = stdout_of(&out);
    assert!(stdout.contains("first\n"), "stdout: {stdout}");
    assert!(stdout.contains("second\n"), "stdout: {stdout}");
}

#[test]
fn pipeline_into_filter() {
    let out = shell("echo b a c |\nwc -w\nexit\n");
    assert!(stdout_of(&out).contains('3'));
}

#[test]
fn blank_line_keeps_pipeline_pending() {
    let out = shell("echo kept |\n\ncat\nexit\n");
    assert!(stdout_of(&out).contains("kept\n"));
}

#[test]
fn exit_with_pending_pipeline_succeeds() {
    let out = shell("echo hi |\nexit\n");
    assert!(out.status.success());
}

#[test]
fn redirect_to_file() {
    let home = scratch_home();
    let target = home.path().join("out.txt");
    let out = shell_in(home.path(), &format!("echo hi > {}\nexit\n", target.display()));
    assert!(out.status.success());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hi\n");
    assert!(!stdout_of(&out).contains("hi"));
}

#[test]
fn redirect_appends_by_default() {
    let home = scratch_home();
    let target = home.path().join("log.txt");
    let line = format!("echo again > {}\n", target.display());
    shell_in(home.path(), &format!("{line}{line}exit\n"));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "again\nagain\n");
}

#[test]
fn redirect_truncate_mode() {
    let home = scratch_home();
    write_overlay(home.path(), "[redirection]\nmode = \"truncate\"\n");
    let target = home.path().join("t.txt");
    std::fs::write(&target, "old contents that are long\n").unwrap();
    shell_in(home.path(), &format!("echo new > {}\nexit\n", target.display()));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "new\n");
}

#[test]
fn redirect_right_hand_side() {
    let home = scratch_home();
    let target = home.path().join("piped.txt");
    shell_in(
        home.path(),
        &format!("echo through |\ncat > {}\nexit\n", target.display()),
    );
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "through\n");
}

#[test]
fn redirect_file_mode_follows_umask() {
    use nix::sys::stat::{Mode, umask};
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::CommandExt;

    let home = scratch_home();
    let open_target = home.path().join("open.txt");
    let masked_target = home.path().join("masked.txt");
    let run = |mask: Mode, target: &Path| {
        let mut cmd = shell_command(home.path());
        // SAFETY: umask(2) is async-signal-safe.
        unsafe {
            cmd.pre_exec(move || {
                let _ = umask(mask);
                Ok(())
            });
        }
        feed(cmd, format!("echo x > {}\nexit\n", target.display()).as_bytes())
    };

    run(Mode::empty(), &open_target);
    run(Mode::from_bits_truncate(0o022), &masked_target);

    let mode_of = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode_of(&open_target), 0o666);
    assert_eq!(mode_of(&masked_target), 0o644);
}

#[test]
fn staged_left_side_skips_redirection() {
    let home = scratch_home();
    let out = shell_in(home.path(), "echo a > f |\ncat\nexit\n");
    assert!(stdout_of(&out).contains("a > f\n"), "stdout: {}", stdout_of(&out));
    assert!(!home.path().join("f").exists());
}

#[test]
fn overlong_line_truncated_and_run() {
    let home = scratch_home();
    let mut input = b"echo ok ".to_vec();
    input.extend(std::iter::repeat_n(b'x', 1100));
    input.extend(b"\xff\nexit\n");
    let out = feed(shell_command(home.path()), &input);
    assert!(out.status.success());
    let stdout = stdout_of(&out);
    let printed = stdout
        .lines()
        .find(|l| l.contains("ok x"))
        .unwrap_or_else(|| panic!("nothing echoed: {stdout}"));
    // 1024 bytes kept: "echo ok " and 1016 x's.
    assert_eq!(printed.matches('x').count(), 1016);
}

#[test]
fn unknown_program_reported_and_loop_continues() {
    let out = shell("nonexistentprogXYZ\necho after\nexit\n");
    assert!(out.status.success());
    assert!(stderr_of(&out).contains("execv: "), "stderr: {}", stderr_of(&out));
    assert!(stdout_of(&out).contains("after\n"));
}

#[test]
fn too_many_arguments_rejected() {
    let words = vec!["x"; 20].join(" ");
    let out = shell(&format!("echo {words}\nexit\n"));
    assert!(stderr_of(&out).contains("too many arguments"));
    assert!(!stdout_of(&out).contains("x x x"));
}

#[test]
fn search_dirs_from_overlay() {
    let home = scratch_home();
    write_overlay(
        home.path(),
        "[launcher]\nreplace = true\nsearch_dirs = [\"/nonexistent-dir\"]\n",
    );
    let out = shell_in(home.path(), "echo unreachable\nexit\n");
    assert!(!stdout_of(&out).contains("unreachable"));
    assert!(stderr_of(&out).contains("execv: "));
}

#[test]
fn custom_prompt_and_keyword() {
    let home = scratch_home();
    write_overlay(
        home.path(),
        "[settings]\nprompt = \"> \"\nexit_keyword = \"quit\"\n",
    );
    let out = shell_in(home.path(), "quit\n");
    assert!(out.status.success());
    assert_eq!(stdout_of(&out), "> ");
}

#[test]
fn session_log_written() {
    let home = scratch_home();
    shell_in(home.path(), "echo logged\nexit\n");
    let log = std::fs::read_to_string(home.path().join(".local/share/minishell/session.log"))
        .expect("session log");
    assert!(log.contains("session started"));
    assert!(log.contains("echo logged"));
}

#[test]
fn dump_config_prints_merged_toml() {
    let home = scratch_home();
    let out = Command::new(BIN)
        .arg("--dump-config")
        .env("HOME", home.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = stdout_of(&out);
    assert!(stdout.contains("search_dirs"));
    assert!(stdout.contains("/usr/bin"));
}

#[test]
fn unknown_flag_fails() {
    let out = Command::new(BIN).arg("--bogus").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn interrupt_kills_child_not_shell() {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;
    use std::os::unix::process::CommandExt;

    let home = scratch_home();
    let mut child = shell_command(home.path())
        .process_group(0)
        .spawn()
        .expect("spawn minishell");
    let mut stdin = child.stdin.take().unwrap();
    let started = Instant::now();

    stdin.write_all(b"sleep 30\n").unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(Duration::from_millis(500));

    // Ctrl-C goes to the whole foreground process group.
    killpg(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();

    stdin.write_all(b"echo alive\nexit\n").unwrap();
    drop(stdin);
    let out = child.wait_with_output().unwrap();

    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(out.status.success());
    assert!(stdout_of(&out).contains("alive\n"));
}
