use clap::Parser;
use serde_json::Value;

use anomaly_records::records::GetRecordsRequest;

#[derive(Parser)]
#[command(name = "records-cli")]
#[command(about = "Query anomaly records from a running service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9200")]
    url: String,

    #[arg(long, default_value = "/_xpack/ml")]
    base_path: String,

    /// Job whose records to fetch
    job_id: String,

    #[arg(long)]
    start: Option<String>,

    #[arg(long)]
    end: Option<String>,

    #[arg(long)]
    exclude_interim: bool,

    #[arg(long)]
    from: Option<u32>,

    #[arg(long)]
    size: Option<u32>,

    /// Minimum record score
    #[arg(long)]
    record_score: Option<f64>,

    #[arg(long)]
    sort: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Send the query as a JSON body (POST) instead of query parameters (GET)
    #[arg(long)]
    body: bool,
}

impl Cli {
    fn to_request(&self) -> GetRecordsRequest {
        let mut request = GetRecordsRequest::new(self.job_id.clone());
        if let Some(start) = &self.start {
            request.start = start.clone();
        }
        if let Some(end) = &self.end {
            request.end = end.clone();
        }
        request.exclude_interim = self.exclude_interim;
        if let Some(from) = self.from {
            request.page.from = from;
        }
        if let Some(size) = self.size {
            request.page.size = size;
        }
        if let Some(score) = self.record_score {
            request.record_score = score;
        }
        if let Some(sort) = &self.sort {
            request.sort = sort.clone();
        }
        request.desc = !self.asc;
        request
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let request = cli.to_request();

    let endpoint = format!(
        "{}{}/anomaly_detectors/{}/results/records",
        cli.url.trim_end_matches('/'),
        cli.base_path,
        request.job_id
    );

    let res = if cli.body {
        client.post(&endpoint).json(&request).send().await?
    } else {
        client.get(&endpoint).query(&request.to_flat_params()).send().await?
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: records API returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
