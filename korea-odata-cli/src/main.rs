use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use korea_odata::{
    latlon_to_utm, utm_to_latlon, CodeMapping, FetchOptions, IncomeByDistrict, Record,
    SeoulClient, UtmCoord, VworldClient,
};

const CODE_COLUMN: &str = "ADSTRD_CD";
const INCOME_COLUMN: &str = "MT_AVRG_INCOME_AMT";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 서울 열린데이터 서비스의 행을 수집해 CSV로 출력
    Fetch {
        /// API 서비스명 (예: VwsmAdstrdNcmCnsmpW)
        service: String,

        /// 서울 열린데이터 광장 API 키
        #[arg(short, long)]
        key: String,

        /// 요청당 레코드 수
        #[arg(long, default_value_t = 1000)]
        page_size: usize,

        /// 시작 인덱스 (1-based)
        #[arg(long, default_value_t = 1)]
        start: usize,

        /// 끝 인덱스 (포함)
        #[arg(long)]
        end: Option<usize>,

        /// 전체 수집 상한
        #[arg(long)]
        max_rows: Option<usize>,

        /// 출력 CSV 경로 (생략하면 표준 출력)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// 위경도 [deg] -> UTM [m]
    Utm {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// UTM [m] -> 위경도 [deg]
    UtmInverse {
        #[arg(allow_hyphen_values = true)]
        northing: f64,
        #[arg(allow_hyphen_values = true)]
        easting: f64,
        zone: u8,
        letter: char,
    },

    /// 두 주소 사이 bbox의 행정동 경계 목록
    Districts {
        address1: String,
        address2: String,

        /// VWorld API 키
        #[arg(short, long)]
        key: String,

        /// 최소 면적 [m^2]
        #[arg(long)]
        min_area: Option<f64>,
    },

    /// 법정동코드별 평균 소득 집계 (KIKmix 매핑표 사용)
    Income {
        /// 서울 열린데이터 광장 API 키
        #[arg(short, long)]
        key: String,

        /// KIKmix 매핑표 CSV 경로
        #[arg(short, long, value_name = "FILE")]
        mapping: PathBuf,

        #[arg(long, default_value = "VwsmAdstrdNcmCnsmpW")]
        service: String,

        /// 시도명 필터 (접두사 일치)
        #[arg(long, default_value = "서울")]
        sido: String,

        #[arg(long)]
        max_rows: Option<usize>,

        /// 출력 CSV 경로 (생략하면 표준 출력)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 로그 초기화
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let start_time = std::time::Instant::now();

    match args.command {
        Command::Fetch {
            service,
            key,
            page_size,
            start,
            end,
            max_rows,
            output,
        } => {
            let client = SeoulClient::new(key)?;
            let options = FetchOptions {
                page_size,
                start,
                end,
                max_rows,
                ..Default::default()
            };
            let records = client.fetch_all(&service, &options)?;
            info!("collected {} rows from {}", records.len(), service);
            write_records(&records, output.as_deref())?;
        }
        Command::Utm { lat, lon } => {
            let utm = latlon_to_utm(lat, lon)?;
            println!("zone:     {}{}", utm.zone_number, utm.zone_letter);
            println!("easting:  {:15.3} [m]", utm.easting);
            println!("northing: {:15.3} [m]", utm.northing);
        }
        Command::UtmInverse {
            northing,
            easting,
            zone,
            letter,
        } => {
            let (lat, lon) = utm_to_latlon(&UtmCoord {
                easting,
                northing,
                zone_number: zone,
                zone_letter: letter.to_ascii_uppercase(),
            });
            println!("lat: {:11.6} [°]", lat);
            println!("lon: {:11.6} [°]", lon);
        }
        Command::Districts {
            address1,
            address2,
            key,
            min_area,
        } => {
            let client = VworldClient::new(key)?;
            let mut districts = client.admin_districts(&address1, &address2)?;
            if let Some(min_area) = min_area {
                districts.retain(|d| d.area >= min_area);
            }
            info!("found {} districts", districts.len());

            for district in &districts {
                println!(
                    "{}\t{}\tarea={:.1} m^2\tcentroid=({:.1}, {:.1})",
                    district.code, district.name, district.area, district.centroid.0,
                    district.centroid.1
                );
            }
        }
        Command::Income {
            key,
            mapping,
            service,
            sido,
            max_rows,
            output,
        } => {
            let client = SeoulClient::new(key)?;
            let options = FetchOptions {
                max_rows,
                ..Default::default()
            };
            let records = client.fetch_all(&service, &options)?;
            info!("collected {} income rows from {}", records.len(), service);

            let mapping = CodeMapping::from_csv_path(&mapping, Some(&sido))?;
            info!("loaded {} mapping pairs", mapping.len());

            let table =
                IncomeByDistrict::from_records(&records, &mapping, CODE_COLUMN, INCOME_COLUMN);
            info!("default income = {:.0}", table.default_income());

            write_income(&table, output.as_deref())?;
        }
    }

    info!("total processing time: {:?}", start_time.elapsed());
    Ok(())
}

fn open_csv_writer(output: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    Ok(csv::Writer::from_writer(writer))
}

fn write_records(records: &[Record], output: Option<&Path>) -> Result<()> {
    // 전체 레코드의 컬럼 합집합을 헤더로
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        columns.extend(record.keys().map(String::as_str));
    }
    let columns: Vec<&str> = columns.into_iter().collect();

    let mut writer = open_csv_writer(output)?;
    writer.write_record(&columns)?;
    for record in records {
        let row: Vec<&str> = columns
            .iter()
            .map(|c| record.get(*c).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_income(table: &IncomeByDistrict, output: Option<&Path>) -> Result<()> {
    let mut writer = open_csv_writer(output)?;
    writer.write_record(["legald_cd", "mt_avrg_income_amt"])?;
    for (code, income) in table.iter() {
        let income = format!("{income:.2}");
        writer.write_record([code, income.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
