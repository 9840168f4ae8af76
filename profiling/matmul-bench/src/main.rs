use std::process::ExitCode;

use tilemm::{
    Strategy,
    benchmark::{InputPattern, MatmulBenchmark},
    components::MatmulProblem,
};
use tilemm_runtime::{CpuDevice, CpuRuntime, Runtime};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("matmul-bench");

    let Some((problem, strategies)) = parse(&args[1..]) else {
        eprintln!("Usage: {program} <N> <M> <K> [strategy]");
        eprintln!(
            "Strategies: {}",
            Strategy::named().map(|(name, _)| name).join(", ")
        );
        return ExitCode::FAILURE;
    };

    let client = CpuRuntime::client(&CpuDevice);
    let mut status = ExitCode::SUCCESS;

    for (name, strategy) in strategies {
        let benchmark = MatmulBenchmark::new(problem, strategy, InputPattern::Checkerboard);

        match benchmark.run::<CpuRuntime, f32>(&client) {
            Ok(report) => println!("{name}: {report}"),
            Err(err) => {
                log::warn!("{name} failed on {problem}");
                eprintln!("{name}: {err}");
                status = ExitCode::FAILURE;
            }
        }
    }

    status
}

fn parse(args: &[String]) -> Option<(MatmulProblem, Vec<(&'static str, Strategy)>)> {
    let [n, m, k, rest @ ..] = args else {
        return None;
    };
    let problem = MatmulProblem::new(n.parse().ok()?, m.parse().ok()?, k.parse().ok()?);

    let strategies = match rest {
        [] => Strategy::named().to_vec(),
        [name] => vec![
            Strategy::named()
                .into_iter()
                .find(|(candidate, _)| *candidate == name.as_str())?,
        ],
        _ => return None,
    };

    Some((problem, strategies))
}
