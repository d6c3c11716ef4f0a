use crate::infra::{
    load_catalog, seed_profiles, InMemoryCatalog, InMemoryInteractionLog, InMemoryPointsLedger,
    InMemoryProfiles,
};
use chrono::{DateTime, Utc};
use clap::Args;
use donate_swipe::config::AppConfig;
use donate_swipe::engagement::{
    CandidateFilter, Engagement, InteractionSubmission, InteractionType, PointsRequest,
    RankedRequest, ReasonCode,
};
use donate_swipe::error::AppError;
use donate_swipe::session::Session;
use std::path::PathBuf;
use std::sync::Arc;

type DemoEngagement =
    Engagement<InMemoryCatalog, InMemoryProfiles, InMemoryInteractionLog, InMemoryPointsLedger>;

#[derive(Args, Debug)]
pub(crate) struct FeedArgs {
    /// User whose feed should be ranked
    #[arg(long, default_value = "donor-1")]
    pub(crate) user: String,
    /// Maximum number of requests to print
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Only rank requests in this category
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Seed the catalog from a CSV export instead of the built-in requests
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed the catalog from a CSV export instead of the built-in requests
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Skip the points and levels portion of the demo
    #[arg(long)]
    pub(crate) skip_points: bool,
}

fn build_engagement(csv: Option<PathBuf>, now: DateTime<Utc>) -> Result<DemoEngagement, AppError> {
    let config = AppConfig::load()?;
    let catalog = load_catalog(csv.as_deref(), now)?;

    Ok(Engagement::new(
        Arc::new(catalog),
        Arc::new(InMemoryProfiles::new(seed_profiles())),
        Arc::new(InMemoryInteractionLog::default()),
        Arc::new(InMemoryPointsLedger::default()),
        &config.feed,
    ))
}

pub(crate) fn run_feed(args: FeedArgs) -> Result<(), AppError> {
    let FeedArgs {
        user,
        limit,
        category,
        catalog_csv,
    } = args;

    let now = Utc::now();
    let engagement = build_engagement(catalog_csv, now)?;
    let session = Session::new(user.clone(), "cli");
    let filter = CandidateFilter {
        category,
        expires_after: Some(now),
    };

    match engagement.feed.ranked_feed(&session, &filter, now, limit) {
        Ok(feed) => {
            println!("Swipe feed for {user}");
            render_feed(&feed);
        }
        Err(err) => println!("Feed unavailable: {err}"),
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        catalog_csv,
        skip_points,
    } = args;

    let now = Utc::now();
    let engagement = build_engagement(catalog_csv, now)?;
    let session = Session::new("newcomer", "demo");
    let filter = CandidateFilter {
        category: None,
        expires_after: Some(now),
    };

    println!("DonateSwipe engagement demo");
    println!("\nCold-start feed (no history, no declared interests)");
    let feed = match engagement.feed.ranked_feed(&session, &filter, now, Some(5)) {
        Ok(feed) => feed,
        Err(err) => {
            println!("  Feed unavailable: {err}");
            return Ok(());
        }
    };
    render_feed(&feed);

    println!("\nSwiping through the feed");
    let swipes = feed.iter().zip([
        InteractionType::Skip,
        InteractionType::Favorite,
        InteractionType::View,
        InteractionType::Share,
    ]);
    for (entry, interaction) in swipes {
        let submission = InteractionSubmission::new(&entry.request.id.0, interaction);
        match engagement.recorder.record(&session, submission, now) {
            Ok(event) => println!(
                "- {} on {} (weight {})",
                interaction.label(),
                entry.request.title,
                event.interaction_value()
            ),
            Err(err) => println!(
                "- {} on {} not recorded: {err}",
                interaction.label(),
                entry.request.id
            ),
        }
    }

    println!("\nFeed after swiping");
    match engagement.feed.ranked_feed(&session, &filter, now, Some(5)) {
        Ok(feed) => render_feed(&feed),
        Err(err) => println!("  Feed unavailable: {err}"),
    }

    if skip_points {
        return Ok(());
    }

    println!("\nPoints and levels");
    let awards = [
        ReasonCode::ProfileComplete,
        ReasonCode::FirstDonation,
        ReasonCode::ProfileComplete,
        ReasonCode::DonationMade,
    ];
    for reason_code in awards {
        let request = PointsRequest {
            reason_code,
            amount: i64::from(reason_code.suggested_amount()),
            description: String::new(),
        };
        match engagement.points.add_points(&session, request, now) {
            Ok(transaction) => println!(
                "- {} +{} ({})",
                reason_code.label(),
                transaction.amount,
                transaction.id.0
            ),
            Err(err) => println!("- {} rejected: {err}", reason_code.label()),
        }
    }

    let redemption = PointsRequest {
        reason_code: ReasonCode::RewardRedeemed,
        amount: 60,
        description: "Charity tote bag".to_string(),
    };
    match engagement.points.spend_points(&session, redemption, now) {
        Ok(transaction) => println!(
            "- redeemed {} points ({})",
            transaction.amount, transaction.description
        ),
        Err(err) => println!("- redemption rejected: {err}"),
    }

    match engagement.points.user_points(&session) {
        Ok(points) => {
            println!(
                "  Balance {} | level {} {} | {}% to next level",
                points.total_points, points.level, points.level_name, points.progress_percent
            );
            if let Some(next) = points.next_level_points {
                println!("  Next level at {next} points");
            }
        }
        Err(err) => println!("  Points unavailable: {err}"),
    }

    Ok(())
}

fn render_feed(feed: &[RankedRequest]) {
    if feed.is_empty() {
        println!("  (no open requests)");
        return;
    }

    for (position, entry) in feed.iter().enumerate() {
        println!(
            "{:>2}. [{:>6.2}] {} ({}, {} urgency, {:.0}% funded)",
            position + 1,
            entry.score,
            entry.request.title,
            entry.request.category,
            entry.request.urgency.label(),
            funded_percent(entry)
        );
        for component in &entry.components {
            println!(
                "      {:?}: {:+.2} ({})",
                component.signal, component.score, component.notes
            );
        }
        if !entry.degraded_signals.is_empty() {
            println!("      degraded: {:?}", entry.degraded_signals);
        }
    }
}

fn funded_percent(entry: &RankedRequest) -> f64 {
    if entry.request.target_amount > 0.0 {
        entry.request.current_amount / entry.request.target_amount * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::seed_catalog;

    #[test]
    fn seeded_engagement_ranks_every_open_request() {
        let now = Utc::now();
        let engagement = build_engagement(None, now).expect("engagement builds");
        let session = Session::new("donor-1", "test");

        let feed = engagement
            .feed
            .ranked_feed(&session, &CandidateFilter::default(), now, Some(50))
            .expect("feed ranks");

        assert_eq!(feed.len(), seed_catalog(now).len());
        assert!(feed.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn funded_percent_guards_zero_targets() {
        let now = Utc::now();
        let mut request = seed_catalog(now).remove(0);
        request.target_amount = 0.0;
        let entry = RankedRequest {
            request,
            score: 0.0,
            components: Vec::new(),
            degraded_signals: Vec::new(),
        };

        assert_eq!(funded_percent(&entry), 0.0);
    }
}
