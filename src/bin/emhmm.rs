use clap::{value_t, App, Arg, ArgMatches, SubCommand};
use emhmm::gen_seq::{random_model, Generate};
use emhmm::io::{self, Problem};
use emhmm::{HmmError, Training, TrainingConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
#[macro_use]
extern crate log;

fn common_args(app: App<'static, 'static>) -> App<'static, 'static> {
    app.version("0.1")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Number of threads"),
        )
}

fn input_arg() -> Arg<'static, 'static> {
    Arg::with_name("input")
        .long("input")
        .short("i")
        .value_name("FILE")
        .takes_value(true)
        .help("Problem file. Read from stdin if not given.")
}

fn subcommand_probability() -> App<'static, 'static> {
    common_args(SubCommand::with_name("probability"))
        .about("Probability of the sequence, summing up all the hidden paths.")
        .arg(input_arg())
        .arg(
            Arg::with_name("log")
                .long("log")
                .help("Output the natural logarithm, computed in the log space."),
        )
}

fn subcommand_viterbi() -> App<'static, 'static> {
    common_args(SubCommand::with_name("viterbi"))
        .about("The most probable hidden path of the sequence.")
        .arg(input_arg())
}

fn subcommand_learning(name: &'static str, about: &'static str) -> App<'static, 'static> {
    common_args(SubCommand::with_name(name))
        .about(about)
        .arg(input_arg())
        .arg(
            Arg::with_name("iterations")
                .long("iterations")
                .short("n")
                .takes_value(true)
                .help("Number of iterations. Overrides the one in the input."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Output the fitted model in JSON."),
        )
}

fn subcommand_sample() -> App<'static, 'static> {
    common_args(SubCommand::with_name("sample"))
        .about("Sample a random model and a sequence from it, in the problem format.")
        .arg(
            Arg::with_name("states")
                .long("states")
                .takes_value(true)
                .default_value("2")
                .help("Number of states"),
        )
        .arg(
            Arg::with_name("symbols")
                .long("symbols")
                .takes_value(true)
                .default_value("3")
                .help("Number of symbols"),
        )
        .arg(
            Arg::with_name("length")
                .long("length")
                .short("l")
                .takes_value(true)
                .default_value("100")
                .help("Length of the sequence"),
        )
        .arg(
            Arg::with_name("iterations")
                .long("iterations")
                .short("n")
                .takes_value(true)
                .help("Iteration count to write in the problem."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
}

fn read_problem(matches: &ArgMatches) -> Result<Problem, HmmError> {
    let input = matches.value_of("input");
    io::read_problem(&input)
}

fn probability(matches: &ArgMatches) -> Result<(), HmmError> {
    let Problem { sequence, model, .. } = read_problem(matches)?;
    if matches.is_present("log") {
        println!("{}", model.log_likelihood(&sequence)?);
    } else {
        let lk = model.likelihood(&sequence)?;
        println!("{}", io::format_probability(lk));
    }
    Ok(())
}

fn viterbi(matches: &ArgMatches) -> Result<(), HmmError> {
    let Problem { sequence, model, .. } = read_problem(matches)?;
    let (lk, path) = model.viterbi(&sequence)?;
    info!("VITERBI\t{:e}", lk);
    println!("{}", io::format_path(&model, &path));
    Ok(())
}

fn learning(matches: &ArgMatches, method: Training) -> Result<(), HmmError> {
    let problem = read_problem(matches)?;
    let iterations = match matches.value_of("iterations") {
        Some(_) => Some(value_t!(matches, "iterations", usize).unwrap_or_else(|e| e.exit())),
        None => problem.iterations,
    };
    let iterations = iterations.ok_or_else(|| HmmError::Parse {
        line: 1,
        reason: "no iteration count in the input nor in --iterations".to_string(),
    })?;
    let config = TrainingConfig::new(iterations, method);
    info!("FIT\t{:?}\t{}", method, iterations);
    let model = problem.model.fit(&problem.sequence, &config)?;
    if matches.is_present("json") {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        println!("{}", io::format_tables(&model));
    }
    Ok(())
}

fn sample(matches: &ArgMatches) -> Result<(), HmmError> {
    let states = value_t!(matches, "states", usize).unwrap_or_else(|e| e.exit());
    let symbols = value_t!(matches, "symbols", usize).unwrap_or_else(|e| e.exit());
    let length = value_t!(matches, "length", usize).unwrap_or_else(|e| e.exit());
    let seed = value_t!(matches, "seed", u64).unwrap_or_else(|e| e.exit());
    let iterations = match matches.value_of("iterations") {
        Some(_) => Some(value_t!(matches, "iterations", usize).unwrap_or_else(|e| e.exit())),
        None => None,
    };
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
    let model = random_model(&mut rng, states, symbols)?;
    let (path, sequence) = model.gen(length, &mut rng);
    if sequence.is_empty() {
        return Err(HmmError::Shape("the sequence is empty".to_string()));
    }
    info!("PATH\t{}", io::format_path(&model, &path));
    let problem = Problem {
        iterations,
        sequence,
        model,
    };
    println!("{}", problem);
    Ok(())
}

fn main() -> Result<(), HmmError> {
    let matches = App::new("emhmm")
        .version("0.1")
        .about("Decoding and learning of discrete hidden Markov models: [PROBLEM]->[PROBABILITY|PATH|MODEL]")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_probability())
        .subcommand(subcommand_viterbi())
        .subcommand(subcommand_learning(
            "baum-welch",
            "Fit the model by Baum-Welch algorithm.",
        ))
        .subcommand(subcommand_learning(
            "viterbi-learning",
            "Fit the model by Viterbi learning.",
        ))
        .subcommand(subcommand_sample())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        let threads = value_t!(sub_m, "threads", usize).unwrap_or_else(|e| e.exit());
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
    debug!("Start");
    match matches.subcommand() {
        ("probability", Some(sub_m)) => probability(sub_m),
        ("viterbi", Some(sub_m)) => viterbi(sub_m),
        ("baum-welch", Some(sub_m)) => learning(sub_m, Training::BaumWelch),
        ("viterbi-learning", Some(sub_m)) => learning(sub_m, Training::Viterbi),
        ("sample", Some(sub_m)) => sample(sub_m),
        _ => unreachable!(),
    }
}
