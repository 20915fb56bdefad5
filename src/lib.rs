//! Meetupの次回イベントの参加者（"yes" のRSVP）をCSVにまとめ、
//! Googleスプレッドシートとしてアップロードして共有する。

pub mod app;
pub mod attendee;
pub mod config;
pub mod csv_writer;
pub mod error;
pub mod google;
pub mod meetup;
pub mod spreadsheet;
pub mod utils;

#[cfg(test)]
mod test_server;
