// SPDX: CC0-1.0

use anyhow::Context;
use calc_notation::{
    compile, evaluate_numeric, format_number,
    history::History,
    sample_function,
    shell::{self, Command},
    stdlib::X,
    AngleMode, Curve, LastAnswer, Number, Window,
};
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_filename(now: DateTime<Local>, ext: &str) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        ext
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    expr: Option<String>,
    win: Window,
    angle: AngleMode,
    ans: LastAnswer,
    history: History,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        expr: Some(String::from("sin(x)")),
        win: Window::default(),
        angle: AngleMode::default(),
        ans: LastAnswer::default(),
        history: History::default(),
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        if let Some(ref expr) = state.expr {
            writeln!(stdout, "y = {expr}")?;
        } else {
            writeln!(stdout, "y is not set")?;
        }
        writeln!(stdout, "angles in {}, ANS = {}", state.angle, state.ans)?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Calc => calc(&mut stdout, &mut state)?,

                Command::SetExpr => set_expr(&mut stdout, &mut state)?,

                Command::Plot => plot_expr(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Angle => {
                    state.angle = state.angle.toggled();
                    writeln!(stdout, "angles are now in {}", state.angle)?;
                }

                Command::History => {
                    if state.history.is_empty() {
                        writeln!(stdout, "(empty)")?;
                    }
                    for entry in state.history.iter() {
                        writeln!(stdout, "[{}] {entry}", entry.at().format("%H:%M:%S"))?;
                    }
                }

                Command::PrintProg => print_prog(&mut stdout, &state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn calc<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "= ")?;
    if input.is_empty() {
        return Ok(());
    }

    let res = evaluate_numeric(&input, state.angle, &mut state.ans);
    match &res {
        Ok(val) => writeln!(out, "{}", format_number(*val))?,
        Err(err) => {
            shell::report(&mut out, err)?;
            writeln!(out, "Error")?;
        }
    }
    state.history.commit(input, &res);

    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "y = ")?;
    if input.is_empty() {
        return Ok(());
    }

    // report syntax errors now rather than at plot time
    if let Err(err) = compile(&input, state.angle, &state.ans) {
        shell::report(&mut out, &err)?;
    }
    state.expr = Some(input);

    Ok(())
}

fn print_prog<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(ref expr) = state.expr else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };
    shell::dump_program(&mut out, expr, state.angle, &state.ans)?;
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("x min", &mut state.win.x.start),
        ("x max", &mut state.win.x.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: samples must be a nonzero integer")?;
    match shell::read_fromstr::<_, NonZeroU16>(
        &mut out,
        format_args!("?samples (is {cur}) = ", cur = state.win.samples),
        true,
    )? {
        Ok(Some(new)) => state.win.samples = new,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }

    Ok(())
}

fn plot_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(ref expr) = state.expr else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    let curve = match sample_function(expr, X, &state.win, state.angle, &state.ans) {
        Ok(curve) => curve,
        Err(err) => {
            shell::report(&mut out, &err)?;
            return Ok(());
        }
    };

    writeln!(out, "evaluation ok")?;
    if curve.excluded > 0 {
        writeln!(
            out,
            "note: {excluded} of {total} samples are undefined and left as gaps",
            excluded = curve.excluded,
            total = curve.samples.len()
        )?;
    }
    let Some(y) = curve.y_range() else {
        writeln!(out, "error: the expression is undefined across the whole window")?;
        return Ok(());
    };
    writeln!(out, "y range: {min} to {max}", min = y.start, max = y.end)?;

    // set up gnuplot
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }
    let now = Local::now();
    let data_path = output_filename(now, "data");
    let gnuplot_path = output_filename(now, "gnuplot");
    let svg_path = output_filename(now, "svg");

    write_data(&data_path, &curve)?;

    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    // set output info
    let [width, height] = OUTPUT_RES;
    writeln!(gnuplot, "set terminal svg size {width},{height} enhanced")?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    // set window
    let win = &state.win;
    writeln!(
        gnuplot,
        "set xrange[{min}:{max}]",
        min = win.x.start,
        max = win.x.end
    )?;
    writeln!(gnuplot, "set yrange[{min}:{max}]", min = y.start, max = y.end)?;

    // configure appearence
    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;
    writeln!(gnuplot, r#"set xlabel "{X}""#)?;
    writeln!(gnuplot, r#"set ylabel "y""#)?;
    writeln!(gnuplot, "set tics out nomirror")?;
    writeln!(gnuplot, "set key out vertical top right")?;

    // blank lines in the data split the curve at gaps
    writeln!(gnuplot, r#"plot '{data_path}' using 1:2 with lines lc '#27422e' \"#)?;
    writeln!(gnuplot, r#"  title "y = {expr} ({angle})" noenhance"#, angle = state.angle)?;

    // display window
    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    // done with the file
    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    // spawn gnuplot and provide the path to the file
    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;

    state.gnuplot = Some(child);

    Ok(())
}

fn write_data(path: &str, curve: &Curve) -> anyhow::Result<()> {
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .context("failed to open output data file")?,
    );
    for (i, segment) in curve.segments().enumerate() {
        if i > 0 {
            writeln!(data).context("failed to write to output data file")?;
        }
        for sample in segment {
            if let Some(y) = sample.y {
                writeln!(data, "{x} {y}", x = sample.x)
                    .context("failed to write to output data file")?;
            }
        }
    }
    data.flush()?;
    data.get_mut().sync_data()?;
    Ok(())
}
