// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Blocking backend client.
//!
//! Every call is one request/response round trip with no retry. Calls block,
//! so the UI runs them on worker threads (see `crate::jobs`).

use super::error::ApiError;
use super::wire::{self, HealthStatus};
use crate::config::BackendConfig;
use crate::models::player::{DetectionResult, Point};
use crate::models::video::UploadPart;
use reqwest::blocking::{multipart, Client, RequestBuilder};

/// Client for the three backend endpoints plus frame image download.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the body of a 2xx response.
    fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            log::error!("API error: {} {}", status.as_u16(), body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn video_part(video: &UploadPart) -> Result<multipart::Part, ApiError> {
        let part = multipart::Part::file(&video.path)?
            .file_name(video.file_name.clone())
            .mime_str(&video.mime_type)?;
        Ok(part)
    }

    /// `GET /health`. Informational only.
    pub fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let body = self.send(self.client.get(self.url("health")))?;
        wire::parse_health(&body)
    }

    /// `POST /analyze_frame`: detect players in the frame at `time_in_seconds`.
    pub fn analyze_frame(&self, video: &UploadPart, time_in_seconds: f64) -> Result<DetectionResult, ApiError> {
        log::info!("Analyzing frame of {} at {:.2}s", video.file_name, time_in_seconds);

        let form = multipart::Form::new()
            .part("video", Self::video_part(video)?)
            .text("time_in_seconds", time_in_seconds.to_string());

        let body = self.send(self.client.post(self.url("analyze_frame")).multipart(form))?;
        let result = wire::parse_analyze_frame(&body)?;
        log::info!("Frame analysis returned {} players", result.players.len());
        Ok(result)
    }

    /// `POST /analyze_with_gemini`: generate a report for the player at
    /// `player_coordinates`. Returns the report text.
    pub fn analyze_with_ai(
        &self,
        video: &UploadPart,
        time_in_seconds: f64,
        player_coordinates: Point,
        prompt: &str,
    ) -> Result<String, ApiError> {
        log::info!(
            "Requesting AI analysis of {} at {:.2}s for ({}, {}), prompt {} chars",
            video.file_name,
            time_in_seconds,
            player_coordinates.x,
            player_coordinates.y,
            prompt.chars().count()
        );

        let coordinates = serde_json::json!({
            "x": player_coordinates.x,
            "y": player_coordinates.y,
        });
        let form = multipart::Form::new()
            .part("video", Self::video_part(video)?)
            .text("time_in_seconds", time_in_seconds.to_string())
            .text("player_coordinates", coordinates.to_string())
            .text("prompt", prompt.to_string());

        let body = self.send(self.client.post(self.url("analyze_with_gemini")).multipart(form))?;
        wire::parse_analyze_with_ai(&body)
    }

    /// Resolve a frame URL from the backend. Relative URLs are taken
    /// relative to the backend's base URL.
    fn frame_url(&self, url: &str) -> Result<reqwest::Url, ApiError> {
        let base = reqwest::Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| ApiError::Decode(format!("invalid backend URL {}: {}", self.base_url, e)))?;
        base.join(url.trim())
            .map_err(|e| ApiError::Decode(format!("invalid frame URL {:?}: {}", url, e)))
    }

    /// Download the annotated frame image.
    pub fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.frame_url(url)?;
        log::debug!("Downloading frame from {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serve exactly one canned response on a loopback port. The handle
    /// yields the raw request that was received.
    fn serve_once(status: &str, content_type: &str, body: &[u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let status = status.to_string();
        let content_type = content_type.to_string();
        let body = body.to_vec();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            let mut chunked = false;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
                    chunked = true;
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }

            let mut request_body = Vec::new();
            if chunked {
                loop {
                    let mut size_line = String::new();
                    reader.read_line(&mut size_line).unwrap();
                    let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
                    let mut chunk = vec![0u8; size + 2];
                    reader.read_exact(&mut chunk).unwrap();
                    if size == 0 {
                        break;
                    }
                    request_body.extend_from_slice(&chunk[..size]);
                }
            } else {
                request_body.resize(content_length, 0);
                reader.read_exact(&mut request_body).unwrap();
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                content_type,
                body.len()
            )
            .unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();

            head + &String::from_utf8_lossy(&request_body)
        });

        (base_url, handle)
    }

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&BackendConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 10,
        })
        .unwrap()
    }

    fn video_fixture(dir: &tempfile::TempDir) -> UploadPart {
        let path = dir.path().join("match.mp4");
        std::fs::write(&path, b"\0\0\0\x18ftypisomFAKEVIDEOBYTES").unwrap();
        UploadPart {
            path,
            file_name: "match.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        }
    }

    #[test]
    fn test_health_check() {
        let (base_url, server) = serve_once("200 OK", "application/json", br#"{"status":"healthy"}"#);
        let status = client_for(&base_url).health_check().unwrap();
        assert!(status.is_healthy());

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /health HTTP/1.1"));
    }

    #[test]
    fn test_analyze_frame_sends_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let video = video_fixture(&dir);
        let body = br#"{"success":true,"annotated_frame_url":"http://x/f.jpg",
            "players_data":[{"id":1,"bbox":[1,2,3,4],"center":[2,3]}],
            "image_dimensions":{"width":640,"height":360},"video_duration":20.0}"#;
        let (base_url, server) = serve_once("200 OK", "application/json", body);

        let result = client_for(&base_url).analyze_frame(&video, 12.5).unwrap();
        assert_eq!(result.players.len(), 1);
        assert_eq!(result.annotated_frame_url, "http://x/f.jpg");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /analyze_frame HTTP/1.1"));
        assert!(request.contains("name=\"video\"; filename=\"match.mp4\""));
        assert!(request.contains("FAKEVIDEOBYTES"));
        assert!(request.contains("name=\"time_in_seconds\"\r\n\r\n12.5"));
    }

    #[test]
    fn test_analyze_with_ai_sends_coordinates_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let video = video_fixture(&dir);
        let (base_url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"success":true,"analysis":"Good movement."}"#.as_bytes(),
        );

        let report = client_for(&base_url)
            .analyze_with_ai(&video, 3.0, Point::new(425.0, 275.5), "Describe player #2")
            .unwrap();
        assert_eq!(report, "Good movement.");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /analyze_with_gemini HTTP/1.1"));
        assert!(request.contains(r#"{"x":425.0,"y":275.5}"#));
        assert!(request.contains("name=\"prompt\"\r\n\r\nDescribe player #2"));
    }

    #[test]
    fn test_non_2xx_carries_body() {
        let (base_url, server) = serve_once(
            "500 Internal Server Error",
            "application/json",
            br#"{"error":"ROBOFLOW_API_KEY not configured"}"#,
        );
        let err = client_for(&base_url).health_check().unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("ROBOFLOW_API_KEY"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_backend_is_connectivity() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client_for(&base_url).health_check().unwrap_err();
        assert!(err.is_connectivity(), "{err:?}");
    }

    #[test]
    fn test_missing_video_file() {
        let client = client_for("http://127.0.0.1:9");
        let video = UploadPart {
            path: "/definitely/not/here.mp4".into(),
            file_name: "here.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        };
        assert!(matches!(client.analyze_frame(&video, 1.0), Err(ApiError::Io(_))));
    }

    #[test]
    fn test_fetch_image() {
        let (base_url, server) = serve_once("200 OK", "image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]);
        let bytes = client_for(&base_url)
            .fetch_image(&format!("{}/frame.jpg", base_url))
            .unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_image_relative_url() {
        let (base_url, server) = serve_once("200 OK", "image/png", &[0x89, b'P', b'N', b'G']);
        let bytes = client_for(&base_url)
            .fetch_image("/static/frame_analysis/1_annotated_frame.jpg")
            .unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /static/frame_analysis/1_annotated_frame.jpg HTTP/1.1"));
    }

    #[test]
    fn test_frame_url_resolution() {
        let client = client_for("http://localhost:5001/api");
        assert_eq!(
            client.frame_url("static/f.jpg").unwrap().as_str(),
            "http://localhost:5001/api/static/f.jpg"
        );
        assert_eq!(
            client.frame_url("/static/f.jpg").unwrap().as_str(),
            "http://localhost:5001/static/f.jpg"
        );
        assert_eq!(
            client.frame_url("https://cdn.example.test/f.jpg").unwrap().as_str(),
            "https://cdn.example.test/f.jpg"
        );
        assert!(matches!(client.frame_url("http://[bad"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.url("/health"), "http://localhost:5001/health");
    }
}
