//! Orbit Wager entry point
//!
//! Native builds run headless sessions and the containment estimate from the
//! command line. The browser build is driven through `orbit_wager::web`.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use clap::{Parser, Subcommand};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use orbit_wager::geometry::estimate_in_probability;
    use orbit_wager::{
        BatchEnd, GameConfig, GameEvent, GameObserver, Pace, Session, SettlementRecord, Side,
    };

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Three orbiting dots, one triangle")]
    pub struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Estimate how often three random angles enclose the center
        Montecarlo {
            #[arg(long, default_value = "1000000")]
            samples: u64,

            #[arg(long, default_value = "42")]
            seed: u64,
        },
        /// Play a batch of rounds on the virtual clock
        Play {
            #[arg(long, default_value = "10")]
            rounds: u32,

            #[arg(long, default_value = "10")]
            stake: u64,

            /// in or out
            #[arg(long, default_value = "out", value_parser = parse_side)]
            side: Side,

            #[arg(long, default_value = "42")]
            seed: u64,

            /// quick or standard; overrides the loaded config
            #[arg(long, value_parser = parse_pace)]
            pace: Option<Pace>,
        },
    }

    fn parse_side(s: &str) -> Result<Side, String> {
        Side::from_str(s).ok_or_else(|| format!("unknown side '{s}' (expected in or out)"))
    }

    fn parse_pace(s: &str) -> Result<Pace, String> {
        Pace::from_str(s).ok_or_else(|| format!("unknown pace '{s}' (expected quick or standard)"))
    }

    /// Prints one line per settled round
    struct Printer;

    impl GameObserver for Printer {
        fn on_settlement(&mut self, record: &SettlementRecord) {
            println!(
                "round {:>3}  {:<3}  {:?} stake {} payout {} bankroll {}",
                record.round_index,
                record.outcome.as_str(),
                record.result,
                record.stake,
                record.payout,
                record.bankroll_after
            );
        }

        fn on_batch_finished(&mut self, completed: u32, requested: u32, reason: &BatchEnd) {
            println!("batch finished {completed}/{requested}: {reason:?}");
        }
    }

    pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
        match cli.command {
            Command::Montecarlo { samples, seed } => {
                let mut rng = Pcg32::seed_from_u64(seed);
                let report = estimate_in_probability(&mut rng, samples);
                println!(
                    "{} samples: in {:.4} out {:.4} (exact in = 0.25)",
                    report.samples,
                    report.in_fraction(),
                    report.out_fraction()
                );
            }
            Command::Play {
                rounds,
                stake,
                side,
                seed,
                pace,
            } => {
                let mut config = GameConfig::load()?;
                if let Some(pace) = pace {
                    config.apply_preset(pace);
                }
                let mut session = Session::new(config, seed)?;
                if stake > 0 {
                    session.stage_chip(stake)?;
                    session.select_bet_type(Some(side))?;
                }
                session.start_batch(rounds)?;

                let mut printer = Printer;
                session.run_until_idle();
                let mut aborted = None;
                for event in session.drain_events() {
                    event.dispatch(&mut printer);
                    if let GameEvent::RoundAborted { error, .. } = event {
                        aborted = Some(error);
                    }
                }

                let summary = session.history().summary();
                println!(
                    "{} rounds, {} bets: {} won {} lost, net {:+}, bankroll {}",
                    summary.rounds,
                    summary.bets,
                    summary.wins,
                    summary.losses,
                    summary.net(),
                    session.bankroll()
                );
                if session.is_bankrupt() {
                    println!("Game over - out of money");
                }
                if let Some(error) = aborted {
                    return Err(error.into());
                }
            }
        }
        Ok(())
    }

    /// Clap's parse, split out so the error path stays in `main`
    pub fn parse() -> Cli {
        Cli::parse()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orbit Wager (native) starting...");

    if let Err(e) = cli::run(cli::parse()) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is orbit_wager::web::WebSession, this is just to satisfy the compiler
}
