use clap::{Parser, Subcommand};
use domus_locator::estimate::{build_report, render_report};
use domus_locator::facility::{Facility, FacilityResolver, FacilityStore, LocateOutcome};
use domus_locator::geo::format_coords;

/// Domus Locator — estimate a property's position from facility distances.
///
/// Build a roster of nearby facilities (schools, stores, stations) with the
/// walking distance each listing reports, geocode them, and compute the
/// weighted-centroid estimate of where the property actually sits.
///
/// Examples:
///   domus add "Sakura Hospital" --distance 270
///   domus locate 0 "https://maps.example.com/maps/@35.70,139.90,17z"
///   domus geocode --hint "Edogawa, Tokyo" --country jp
///   domus estimate --ratio 0.75
///   domus serve --port 8787
#[derive(Parser)]
#[command(name = "domus", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the facility roster.
    List,

    /// Add a facility.
    Add {
        /// Facility name, as a geocoder would know it.
        name: String,
        /// Reported walking distance in meters.
        #[arg(long, default_value_t = 500.0)]
        distance: f64,
        /// Add disabled (kept in the roster, excluded from estimation).
        #[arg(long)]
        disabled: bool,
    },

    /// Remove a facility by index (see `list`).
    Remove { index: usize },

    /// Include a facility in estimation.
    Enable { index: usize },

    /// Exclude a facility from estimation without removing it.
    Disable { index: usize },

    /// Rename a facility (the geocoder searches by name).
    Rename { index: usize, name: String },

    /// Update a facility's walking distance.
    SetDistance { index: usize, meters: f64 },

    /// Attach a manual location: a map URL or a "lat,lon" pair.
    Locate { index: usize, text: String },

    /// Geocode enabled facilities that have no coordinate yet.
    Geocode {
        /// Also re-geocode provider-sourced coordinates (manual pins stay).
        #[arg(long)]
        refresh: bool,
        /// Skip the network; report what would be looked up.
        #[arg(long)]
        offline: bool,
        /// Area text appended to every query (persisted), e.g. "Edogawa, Tokyo".
        #[arg(long)]
        hint: Option<String>,
        /// Country filter for the geocoder (persisted), e.g. "jp".
        #[arg(long)]
        country: Option<String>,
    },

    /// Estimate the property position from the current roster.
    Estimate {
        /// Walking-to-straight-line ratio; defaults to the stored value.
        #[arg(long)]
        ratio: Option<f64>,
        /// Geocode unresolved facilities first.
        #[arg(long)]
        geocode: bool,
        /// Never touch the network.
        #[arg(long)]
        offline: bool,
    },

    /// Persist a new default straight-line ratio.
    SetRatio { ratio: f64 },

    /// Start the JSON API server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();
    let mut store = FacilityStore::load();

    match cli.command {
        Command::List => list(&store),

        Command::Add { name, distance, disabled } => {
            if name.trim().is_empty() {
                fail("Facility name is empty");
            }
            if !distance.is_finite() || distance < 0.0 {
                fail("Distance must be a non-negative number of meters");
            }
            let mut facility = Facility::new(name.trim(), distance);
            facility.enabled = !disabled;
            let index = store.add(facility);
            eprintln!("  Added [{}] {} ({} m)", index, name.trim(), distance);
        }

        Command::Remove { index } => {
            let removed = store.remove(index).unwrap_or_else(|e| fail(e));
            eprintln!("  Removed [{}] {}", index, removed.name);
        }

        Command::Enable { index } => {
            store.set_enabled(index, true).unwrap_or_else(|e| fail(e));
            eprintln!("  Enabled [{}]", index);
        }

        Command::Disable { index } => {
            store.set_enabled(index, false).unwrap_or_else(|e| fail(e));
            eprintln!("  Disabled [{}]", index);
        }

        Command::Rename { index, name } => {
            if name.trim().is_empty() {
                fail("Facility name is empty");
            }
            store.rename(index, name.trim()).unwrap_or_else(|e| fail(e));
            eprintln!("  Renamed [{}] to {}", index, name.trim());
        }

        Command::SetDistance { index, meters } => {
            if !meters.is_finite() || meters < 0.0 {
                fail("Distance must be a non-negative number of meters");
            }
            store.set_distance(index, meters).unwrap_or_else(|e| fail(e));
            eprintln!("  Distance for [{}] set to {} m", index, meters);
        }

        Command::Locate { index, text } => {
            let resolver = FacilityResolver::from_store(&store);
            let coordinate = resolver
                .set_manual_location(&mut store, index, &text)
                .unwrap_or_else(|e| fail(e));
            eprintln!(
                "  Pinned [{}] at {}",
                index,
                format_coords(coordinate.lat, coordinate.lon)
            );
        }

        Command::Geocode { refresh, offline, hint, country } => {
            if hint.is_some() {
                store.set_area_hint(hint);
            }
            if country.is_some() {
                store.set_country_codes(country);
            }
            run_geocode(&mut store, refresh, offline);
        }

        Command::Estimate { ratio, geocode, offline } => {
            if geocode {
                run_geocode(&mut store, false, offline);
            }

            let ratio = ratio.unwrap_or_else(|| store.ratio());
            if !ratio.is_finite() {
                fail("Ratio must be a finite number");
            }

            let report = build_report(store.facilities(), ratio);
            eprint!("{}", render_report(&report));
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(e),
            }
        }

        Command::SetRatio { ratio } => {
            if !ratio.is_finite() || ratio <= 0.0 {
                fail("Ratio must be a positive number (typically 0 < ratio <= 1)");
            }
            store.set_ratio(ratio);
            eprintln!("  Default ratio set to {:.2}", ratio);
        }

        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
            runtime.block_on(domus_locator::server::start(&host, port));
        }
    }
}

fn list(store: &FacilityStore) {
    if store.is_empty() {
        eprintln!("  Roster is empty. Try: domus add \"Sakura Hospital\" --distance 270");
        return;
    }

    eprintln!("  Straight-line ratio: {:.2}", store.ratio());
    for (i, f) in store.facilities().iter().enumerate() {
        let flag = if f.enabled { "\u{2713}" } else { " " };
        let location = match (f.coordinate, f.source) {
            (Some(c), Some(source)) => {
                format!("{} ({})", format_coords(c.lat, c.lon), source)
            }
            (Some(c), None) => format_coords(c.lat, c.lon),
            _ => "unresolved".to_string(),
        };
        eprintln!(
            "  [{}] {} {:<28} walk {:>5.0} m   {}",
            i, flag, f.name, f.walking_distance_m, location
        );
    }
}

fn run_geocode(store: &mut FacilityStore, refresh: bool, offline: bool) {
    let mut resolver = FacilityResolver::from_store(store);
    resolver.set_offline(offline);

    let outcomes = resolver.locate(store, refresh);
    if outcomes.is_empty() {
        eprintln!("  Nothing to geocode \u{2014} every enabled facility has a location.");
        return;
    }

    for (index, outcome) in outcomes {
        let name = store
            .get(index)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        match outcome {
            LocateOutcome::Located { coordinate, display_name } => {
                eprintln!(
                    "  [{}] {} \u{2192} {}",
                    index,
                    name,
                    format_coords(coordinate.lat, coordinate.lon)
                );
                eprintln!("       {}", display_name);
            }
            LocateOutcome::NotFound => {
                eprintln!("  [{}] {} \u{2192} not found", index, name);
            }
            LocateOutcome::Failed(e) => {
                eprintln!("  [{}] {} \u{2192} failed: {}", index, name, e);
            }
            LocateOutcome::SkippedOffline => {
                eprintln!("  [{}] {} \u{2192} skipped (offline)", index, name);
            }
        }
    }

    let located = store
        .facilities()
        .iter()
        .filter(|f| f.enabled && f.is_located())
        .count();
    if located < 2 {
        eprintln!("  Note: estimation needs at least two enabled, located facilities.");
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}
