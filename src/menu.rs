//! Numbered terminal menu
//!
//! Reads one line per prompt from any [`BufRead`]. End of input cancels the
//! current prompt and, at the main menu, ends the session. Recoverable errors
//! (network, decoding, quota, bad symbol) are printed and the loop continues;
//! fatal ones (storage, terminal IO) are returned to the caller.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::api::stock::format_billions;
use crate::api::weather::{celsius_to_fahrenheit, current_reading, forecast_highlights};
use crate::api::{maps_url, ForecastLinks, Geocoder, Observation, QuoteService, WeatherService};
use crate::storage::ReferenceStore;
use crate::ui::{self, Icons};
use crate::Result;

/// Upstream services the menu talks to
pub struct Services<'a> {
    pub geocoder: &'a dyn Geocoder,
    pub weather: &'a dyn WeatherService,
    pub quotes: &'a dyn QuoteService,
}

/// Whether a quote lookup creates a cache row or refreshes existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteMode {
    Insert,
    Update,
}

/// Where the weather submenu hands control next
enum AfterWeather {
    AnotherAddress,
    MainMenu,
}

pub struct Menu<'a, R: BufRead> {
    store: &'a ReferenceStore,
    services: Services<'a>,
    input: R,
}

impl<'a, R: BufRead> Menu<'a, R> {
    pub fn new(store: &'a ReferenceStore, services: Services<'a>, input: R) -> Self {
        Self { store, services, input }
    }

    /// Run the main menu until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        loop {
            println!();
            ui::header("polyAPI CLI");
            println!();
            ui::option(1, "Get weather for an address");
            ui::option(2, "Get stock quote");
            ui::option(3, "Show cache statistics");
            ui::option(4, "Exit");
            println!();

            let Some(choice) = self.prompt("Enter your option: ")? else {
                break;
            };
            let outcome = match choice.as_str() {
                "1" => self.geocode_menu(),
                "2" => self.ticker_menu(),
                "3" => self.show_stats(),
                "4" => break,
                _ => {
                    ui::warn("Invalid option");
                    Ok(())
                }
            };
            self.recover(outcome)?;
        }
        println!("\nExiting...");
        Ok(())
    }

    /// Print recoverable errors, pass fatal ones up
    fn recover(&self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Err(e) if !e.is_fatal() => {
                warn!("Operation aborted: {}", e);
                ui::error(&e.to_string());
                Ok(())
            }
            other => other,
        }
    }

    /// Print `label`, then read one trimmed line; `None` at end of input
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            println!();
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask for a 1-based row in `1..=len`, reporting bad input
    fn prompt_row(&mut self, len: usize) -> Result<Option<usize>> {
        let Some(text) = self.prompt(&format!("\nEnter the row number (1-{}): ", len))? else {
            return Ok(None);
        };
        match text.parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => Ok(Some(n - 1)),
            Ok(_) => {
                ui::warn("Invalid choice");
                Ok(None)
            }
            Err(_) => {
                ui::warn("Invalid input");
                Ok(None)
            }
        }
    }

    /// Reuse / Delete / Return prompt shared by both listings
    fn prompt_row_action(&mut self) -> Result<Option<String>> {
        println!();
        ui::option(1, "Reuse");
        ui::option(2, "Delete");
        ui::option(3, "Return to previous menu");
        println!();
        self.prompt("Enter your choice: ")
    }

    // ========== Addresses & Weather ==========

    /// Loops while the user keeps picking "Choose another address"
    fn geocode_menu(&mut self) -> Result<()> {
        loop {
            ui::section("Geocode menu");
            ui::option(1, "Enter a new address");
            ui::option(2, "Re-use/delete a previous address");
            println!();

            let next = match self.prompt("Enter your option: ")?.as_deref() {
                Some("1") => self.new_address()?,
                Some("2") => self.reuse_address()?,
                Some(_) => {
                    ui::warn("Invalid option");
                    AfterWeather::MainMenu
                }
                None => AfterWeather::MainMenu,
            };
            if let AfterWeather::MainMenu = next {
                return Ok(());
            }
        }
    }

    fn new_address(&mut self) -> Result<AfterWeather> {
        println!("\nEnter address: (e.g., 432 Park Ave, 10022 or 432 Park Ave NY, NY 10022) [Ctrl+D to cancel]\n");
        let address = match self.prompt("> ")? {
            Some(a) if !a.is_empty() => a,
            Some(_) => {
                ui::warn("No address entered");
                return Ok(AfterWeather::MainMenu);
            }
            None => {
                println!("Cancelled");
                return Ok(AfterWeather::MainMenu);
            }
        };

        let geocoder = self.services.geocoder;
        let found = ui::with_spinner("Geocoding address...", || geocoder.geocode(&address))?;
        let Some(m) = found else {
            ui::warn("No coordinates found");
            return Ok(AfterWeather::MainMenu);
        };

        ui::section("Coordinates");
        ui::summary_row("Address:", &m.matched_address);
        ui::summary_row("Latitude:", &format!("{:.6}", m.latitude));
        ui::summary_row("Longitude:", &format!("{:.6}", m.longitude));
        ui::summary_row("Map:", &maps_url(m.latitude, m.longitude));

        let id = self.store.insert_address(&m.matched_address, m.latitude, m.longitude)?;
        debug!("Cached address {} as id {}", m.matched_address, id);

        self.weather_for(id, m.latitude, m.longitude)
    }

    fn reuse_address(&mut self) -> Result<AfterWeather> {
        let addresses = self.store.list_addresses_distinct()?;
        if addresses.is_empty() {
            ui::warn("No addresses found");
            return Ok(AfterWeather::MainMenu);
        }

        ui::section("Previous addresses");
        println!("{}", ui::address_table(&addresses));

        let Some(idx) = self.prompt_row(addresses.len())? else {
            return Ok(AfterWeather::MainMenu);
        };
        let chosen = &addresses[idx];

        match self.prompt_row_action()?.as_deref() {
            Some("1") => self.weather_for(chosen.id, chosen.latitude, chosen.longitude),
            Some("2") => {
                println!();
                if self.store.delete_address(chosen.id)? > 0 {
                    ui::success("Address deleted successfully.");
                } else {
                    ui::warn("Address not found.");
                }
                Ok(AfterWeather::MainMenu)
            }
            Some("3") | None => Ok(AfterWeather::MainMenu),
            Some(_) => {
                ui::warn("Invalid choice");
                Ok(AfterWeather::MainMenu)
            }
        }
    }

    /// Stations, cached-temperature refresh, then the forecast submenu
    fn weather_for(&mut self, address_id: i64, latitude: f64, longitude: f64) -> Result<AfterWeather> {
        self.print_stations(latitude, longitude)?;

        let weather = self.services.weather;
        let links = ui::with_spinner("Looking up forecast office...", || {
            weather.forecast_links(latitude, longitude)
        })?;

        self.refresh_temperature(address_id, &links)?;
        println!();
        ui::status(Icons::MAP, "Map", &maps_url(latitude, longitude));

        self.weather_submenu(&links)
    }

    fn print_stations(&self, latitude: f64, longitude: f64) -> Result<()> {
        let weather = self.services.weather;
        let stations = ui::with_spinner("Finding nearby stations...", || {
            weather.nearest_stations(latitude, longitude)
        })?;

        ui::section("NOAA weather stations (nearest first)");
        for (i, station) in stations.iter().enumerate() {
            println!("{} Station {}: {}", Icons::STATION, i + 1, station.name);
            ui::summary_row("Identifier:", &station.identifier);
            ui::summary_row("Location:", &maps_url(station.latitude, station.longitude));
            match weather.latest_observation(&station.identifier) {
                Ok(obs) => print_observation(&obs),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => ui::warn(&format!("Error fetching observation data: {}", e)),
            }
            println!();
        }
        Ok(())
    }

    /// Cache the first hourly reading on the address row
    fn refresh_temperature(&self, address_id: i64, links: &ForecastLinks) -> Result<()> {
        let hourly = self.services.weather.periods(&links.forecast_hourly)?;
        let Some(reading) = current_reading(&hourly) else {
            ui::warn("No hourly forecast data available");
            return Ok(());
        };

        if self.store.update_address_temperature(address_id, &reading)? {
            println!();
            ui::success(&format!(
                "Address record updated successfully with latest temperature {}!",
                reading
            ));
        } else {
            warn!("Address {} vanished before its temperature could be cached", address_id);
            ui::warn("Address is no longer cached; temperature not saved");
        }
        Ok(())
    }

    fn weather_submenu(&mut self, links: &ForecastLinks) -> Result<AfterWeather> {
        loop {
            ui::section("NOAA Weather Submenu");
            ui::option(1, "Forecast");
            ui::option(2, "Hourly Forecast");
            ui::option(3, "Choose another address");
            ui::option(4, "Main Menu");
            println!();

            let outcome = match self.prompt("Enter your option: ")?.as_deref() {
                Some("1") => self.print_forecast(&links.forecast),
                Some("2") => self.print_hourly(&links.forecast_hourly),
                Some("3") => return Ok(AfterWeather::AnotherAddress),
                Some("4") | None => return Ok(AfterWeather::MainMenu),
                Some(_) => {
                    ui::warn("Invalid option");
                    Ok(())
                }
            };
            self.recover(outcome)?;
        }
    }

    fn print_forecast(&self, url: &str) -> Result<()> {
        let periods = self.services.weather.periods(url)?;
        if periods.is_empty() {
            ui::warn("No forecast periods available.");
            return Ok(());
        }

        ui::section("Forecast (next 2 days and a week out)");
        for period in forecast_highlights(&periods) {
            let date = period.start_time.split('T').next().unwrap_or_default();
            println!("{} ({})  {}", date, period.name, period.reading());
            println!("  {}\n", period.detailed_forecast);
        }
        Ok(())
    }

    fn print_hourly(&self, url: &str) -> Result<()> {
        let periods = self.services.weather.periods(url)?;

        ui::section("Next 12 hours");
        for period in periods.iter().take(12) {
            println!("{} {}", format_clock(&period.start_time), period.reading());
            println!(" - {}\n", period.short_forecast);
        }
        Ok(())
    }

    // ========== Tickers ==========

    fn ticker_menu(&mut self) -> Result<()> {
        ui::section("Ticker menu");
        ui::option(1, "Enter a new ticker symbol");
        ui::option(2, "Re-use/delete a previous ticker symbol");
        println!();

        match self.prompt("Enter your option: ")?.as_deref() {
            Some("1") => self.new_ticker(),
            Some("2") => self.reuse_ticker(),
            Some(_) => {
                ui::warn("Invalid option");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn new_ticker(&mut self) -> Result<()> {
        let symbol = match self.prompt("\nEnter a ticker symbol: (e.g., AAPL, GOOG) [Ctrl+D to cancel] ")? {
            Some(s) if !s.is_empty() => s.to_uppercase(),
            Some(_) => {
                ui::warn("No ticker symbol entered");
                return Ok(());
            }
            None => {
                println!("Cancelled");
                return Ok(());
            }
        };
        self.quote(&symbol, QuoteMode::Insert)
    }

    fn reuse_ticker(&mut self) -> Result<()> {
        let tickers = self.store.list_tickers_distinct()?;
        if tickers.is_empty() {
            ui::warn("No stock tickers found");
            return Ok(());
        }

        ui::section("Previous ticker symbols");
        println!("{}", ui::ticker_table(&tickers));

        let Some(idx) = self.prompt_row(tickers.len())? else {
            return Ok(());
        };
        let chosen = &tickers[idx];

        match self.prompt_row_action()?.as_deref() {
            Some("1") => self.quote(&chosen.symbol, QuoteMode::Update),
            Some("2") => {
                println!();
                if self.store.delete_ticker(chosen.id)? > 0 {
                    ui::success("Ticker symbol deleted successfully.");
                } else {
                    ui::warn("Ticker symbol not found.");
                }
                Ok(())
            }
            Some("3") | None => Ok(()),
            Some(_) => {
                ui::warn("Invalid choice");
                Ok(())
            }
        }
    }

    /// Quote + overview for `symbol`, cached according to `mode`
    fn quote(&self, symbol: &str, mode: QuoteMode) -> Result<()> {
        let quotes = self.services.quotes;
        let quote = ui::with_spinner("Fetching quote...", || quotes.global_quote(symbol))?;

        println!();
        println!(
            "{} Symbol: {} Price: {} Open: {} Change: {} Change Percent: {}",
            Icons::CHART,
            quote.symbol,
            quote.price,
            quote.open,
            quote.change,
            quote.change_percent
        );
        println!(
            "   High: {} Low: {} Previous Close: {}",
            quote.high, quote.low, quote.previous_close
        );

        let overview = ui::with_spinner("Fetching company overview...", || {
            quotes.overview(&quote.symbol)
        })?;

        match mode {
            QuoteMode::Insert => {
                let id = self.store.insert_ticker(&overview.to_new_ticker(&quote.symbol, &quote.price))?;
                debug!("Cached ticker {} as id {}", quote.symbol, id);
            }
            QuoteMode::Update => {
                let rows = self.store.update_ticker_last_price(&quote.symbol, &quote.price)?;
                debug!("Refreshed {} cached rows for {}", rows, quote.symbol);
            }
        }

        println!();
        ui::summary_row("Exchange:", overview.field("Exchange"));
        ui::summary_row("Sector:", overview.field("Sector"));
        ui::summary_row("Industry:", overview.field("Industry"));
        ui::summary_row("Fiscal Year End:", overview.field("FiscalYearEnd"));
        ui::summary_row("Latest Quarter:", overview.field("LatestQuarter"));
        println!();
        ui::summary_row("Address:", overview.field("Address"));
        ui::summary_row("Official Website:", overview.field("OfficialSite"));
        println!();
        ui::summary_row("Market Cap (B):", &format_billions(overview.number("MarketCapitalization")));
        ui::summary_row("Revenue TTM (B):", &format_billions(overview.number("RevenueTTM")));
        ui::summary_row("Dividend Date:", overview.field("DividendDate"));
        println!();
        ui::summary_row("52 Week High:", overview.field("52WeekHigh"));
        ui::summary_row("52 Week Low:", overview.field("52WeekLow"));
        ui::summary_row("Analyst Target Price:", overview.field("AnalystTargetPrice"));
        println!();
        ui::summary_row("PE Ratio:", overview.field("PERatio"));
        ui::summary_row("Beta:", overview.field("Beta"));
        ui::summary_row("Forward PE:", overview.field("ForwardPE"));
        ui::summary_row("Trailing PE:", overview.field("TrailingPE"));
        println!();
        Ok(())
    }

    // ========== Statistics ==========

    fn show_stats(&self) -> Result<()> {
        let stats = self.store.stats()?;
        ui::section(&format!("{} Cache statistics", Icons::STATS));
        let addresses = format!("{} ({} distinct)", stats.addresses, stats.distinct_addresses);
        let tickers = format!("{} ({} distinct)", stats.tickers, stats.distinct_tickers);
        println!(
            "{}",
            ui::stats_table(&[("Addresses", addresses.as_str()), ("Tickers", tickers.as_str())])
        );
        Ok(())
    }
}

fn print_observation(obs: &Observation) {
    ui::summary_row("Timestamp:", &format_observed_at(&obs.timestamp));
    if let Some(c) = obs.temperature.value {
        ui::summary_row("Temperature:", &format!("{:.2}°F", celsius_to_fahrenheit(c)));
    }
    if let Some(c) = obs.dewpoint.value {
        ui::summary_row("Dewpoint:", &format!("{:.2}°F", celsius_to_fahrenheit(c)));
    }
    if let Some(v) = obs.wind_speed.value {
        ui::summary_row("Wind Speed:", &format!("{:.2} km/h", v));
    }
    if let Some(v) = obs.wind_direction.value {
        ui::summary_row("Wind Direction:", &format!("{:.2}°", v));
    }
    if let Some(v) = obs.relative_humidity.value {
        ui::summary_row("Humidity:", &format!("{:.2}%", v));
    }
    if let Some(v) = obs.barometric_pressure.value {
        ui::summary_row("Pressure:", &format!("{:.2} Pa", v));
    }
    if !obs.text_description.is_empty() {
        ui::summary_row("Description:", &obs.text_description);
    }
}

/// "2024-08-26 at 02:25 PM", keeping the timestamp's own offset
fn format_observed_at(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => t.format("%Y-%m-%d at %I:%M %p").to_string(),
        Err(_) => "Unknown Time".to_string(),
    }
}

/// "02:25 PM" from an RFC 3339 period start
fn format_clock(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => t.format("%I:%M %p").to_string(),
        Err(_) => "Unknown Time".to_string(),
    }
}
