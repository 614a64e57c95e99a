use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no album table found in listing page")]
    AlbumTableMissing,
    #[error("no track table (#songlist) found in album page")]
    TrackTableMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub title: String,
    pub platform: String,
    pub album_type: String,
    pub year: String,
    pub url: String,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub duration: Option<String>,
}

/// Parse the first table of a category listing page into albums.
///
/// The first row is the column header and is skipped. Only the first `limit`
/// rows after the header are considered; rows with fewer than five cells or
/// without a title link are dropped and still count against `limit`.
pub fn parse_album_table(
    doc: &Html,
    base_url: &str,
    limit: usize,
) -> Result<Vec<Album>, ScrapeError> {
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let img_sel = Selector::parse("img").unwrap();

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or(ScrapeError::AlbumTableMissing)?;

    let mut albums = vec![];
    for row in table.select(&row_sel).skip(1).take(limit) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 5 {
            continue;
        }

        // column 1: title + album link
        let Some(title_link) = cells[1].select(&link_sel).next() else {
            continue;
        };
        let title = text_of(&title_link);
        let url = match title_link.value().attr("href") {
            Some(href) if href.starts_with('/') => format!("{}{}", base_url, href),
            Some(href) if href.starts_with("http") => href.to_string(),
            Some(href) => format!("{}/{}", base_url, href),
            None => continue,
        };

        // column 0: cover thumbnail
        let cover = cells[0]
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| absolutize(base_url, src));

        // column 2: platform links, joined
        let platforms: Vec<String> = cells[2].select(&link_sel).map(|a| text_of(&a)).collect();
        let platform = if platforms.is_empty() {
            "Unknown".to_string()
        } else {
            platforms.join(", ")
        };

        albums.push(Album {
            title,
            platform,
            album_type: text_of(&cells[3]),
            year: text_of(&cells[4]),
            url,
            cover,
        });
    }
    Ok(albums)
}

/// Parse the `#songlist` table of an album page into name/duration pairs.
pub fn parse_track_table(doc: &Html) -> Result<Vec<Track>, ScrapeError> {
    let table_sel = Selector::parse("table#songlist").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let link_sel = Selector::parse("td.clickable-row a").unwrap();
    let duration_re = Regex::new(r"^\d+:\d{2}$").unwrap();

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or(ScrapeError::TrackTableMissing)?;

    let mut tracks = vec![];
    for row in table.select(&row_sel) {
        match row.value().attr("id") {
            Some("songlist_header") | Some("songlist_footer") => continue,
            _ => {}
        }
        let texts: Vec<String> = row
            .select(&link_sel)
            .map(|a| text_of(&a))
            .filter(|t| !t.is_empty())
            .collect();
        let Some(name) = texts.iter().find(|t| !duration_re.is_match(t)) else {
            continue;
        };
        let duration = texts.iter().find(|t| duration_re.is_match(t)).cloned();
        tracks.push(Track {
            name: name.clone(),
            duration,
        });
    }
    Ok(tracks)
}

/// Collect every image link under the `div.albumImage` containers.
pub fn parse_cover_links(doc: &Html, base_url: &str) -> Vec<String> {
    let link_sel = Selector::parse("div.albumImage a").unwrap();
    doc.select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| absolutize(base_url, href))
        .collect()
}

/// Main cover from the `#coverImage` container, when the page has one.
pub fn parse_main_cover(doc: &Html, base_url: &str) -> Option<String> {
    let img_sel = Selector::parse("div#coverImage img").unwrap();
    doc.select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| absolutize(base_url, src))
}

fn absolutize(base_url: &str, src: &str) -> Option<String> {
    if src.starts_with('/') {
        Some(format!("{}{}", base_url, src))
    } else if src.starts_with("http") {
        Some(src.to_string())
    } else {
        None
    }
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://downloads.khinsider.com";

    const LISTING_HTML: &str = r#"
        <html><body>
        <table>
          <tr><th>Cover</th><th>Album</th><th>Platform</th><th>Type</th><th>Year</th></tr>
          <tr>
            <td><img src="/images/thumbs/chrono.jpg"></td>
            <td><a href="/game-soundtracks/album/chrono-trigger"> Chrono Trigger </a></td>
            <td><a href="/snes">SNES</a><a href="/psx">PSX</a></td>
            <td>Gamerip</td>
            <td>1995</td>
          </tr>
          <tr>
            <td><img src="https://cdn.example.com/ff7.jpg"></td>
            <td><a href="https://downloads.khinsider.com/game-soundtracks/album/ff7">FF7</a></td>
            <td></td>
            <td>Soundtrack</td>
            <td></td>
          </tr>
          <tr><td>too</td><td>few</td><td>cells</td></tr>
          <tr>
            <td></td>
            <td>no link here</td>
            <td><a href="/pc">PC</a></td>
            <td>Gamerip</td>
            <td>2001</td>
          </tr>
        </table>
        </body></html>
    "#;

    const ALBUM_HTML: &str = r#"
        <html><body>
        <div class="albumImage"><a href="/images/covers/front.jpg"><img src="/thumb1.jpg"></a></div>
        <div class="albumImage"><a href="https://cdn.example.com/back.jpg"><img src="/thumb2.jpg"></a></div>
        <div id="coverImage"><img src="/images/covers/main.jpg"></div>
        <table id="songlist">
          <tr id="songlist_header"><th>Song Name</th><th>Length</th></tr>
          <tr>
            <td class="playlistDownloadSong"><a href="/dl/1"></a></td>
            <td class="clickable-row"><a href="/track/1">Opening Theme</a></td>
            <td class="clickable-row"><a href="/track/1">2:45</a></td>
          </tr>
          <tr>
            <td class="playlistDownloadSong"><a href="/dl/2"></a></td>
            <td class="clickable-row"><a href="/track/2">Hidden Song</a></td>
            <td class="clickable-row"><a href="/track/2"></a></td>
          </tr>
          <tr id="songlist_footer"><td>Total: 12:34</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn parses_listing_rows_skipping_header_and_malformed() {
        let doc = Html::parse_document(LISTING_HTML);
        let albums = parse_album_table(&doc, BASE, 10).unwrap();
        assert_eq!(albums.len(), 2);

        let first = &albums[0];
        assert_eq!(first.title, "Chrono Trigger");
        assert_eq!(first.platform, "SNES, PSX");
        assert_eq!(first.album_type, "Gamerip");
        assert_eq!(first.year, "1995");
        assert_eq!(
            first.url,
            "https://downloads.khinsider.com/game-soundtracks/album/chrono-trigger"
        );
        assert_eq!(
            first.cover.as_deref(),
            Some("https://downloads.khinsider.com/images/thumbs/chrono.jpg")
        );
    }

    #[test]
    fn keeps_absolute_urls_and_empty_cells() {
        let doc = Html::parse_document(LISTING_HTML);
        let albums = parse_album_table(&doc, BASE, 10).unwrap();
        let second = &albums[1];
        assert_eq!(
            second.url,
            "https://downloads.khinsider.com/game-soundtracks/album/ff7"
        );
        assert_eq!(
            second.cover.as_deref(),
            Some("https://cdn.example.com/ff7.jpg")
        );
        assert_eq!(second.platform, "Unknown");
        assert_eq!(second.album_type, "Soundtrack");
        assert_eq!(second.year, "");
    }

    #[test]
    fn respects_limit() {
        let doc = Html::parse_document(LISTING_HTML);
        let albums = parse_album_table(&doc, BASE, 1).unwrap();
        assert_eq!(albums.len(), 1);
        assert!(parse_album_table(&doc, BASE, 0).unwrap().is_empty());
    }

    #[test]
    fn limit_counts_table_rows_not_parsed_albums() {
        // A skipped row inside the limit window still uses up a slot.
        let html = r#"
            <table>
              <tr><th>Cover</th><th>Album</th><th>Platform</th><th>Type</th><th>Year</th></tr>
              <tr>
                <td></td>
                <td><a href="/game-soundtracks/album/first">First</a></td>
                <td><a href="/pc">PC</a></td>
                <td>Gamerip</td>
                <td>2000</td>
              </tr>
              <tr><td>malformed</td></tr>
              <tr>
                <td></td>
                <td><a href="/game-soundtracks/album/second">Second</a></td>
                <td><a href="/pc">PC</a></td>
                <td>Gamerip</td>
                <td>2001</td>
              </tr>
            </table>
        "#;
        let doc = Html::parse_document(html);
        let albums = parse_album_table(&doc, BASE, 2).unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "First");

        let all = parse_album_table(&doc, BASE, 3).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn missing_album_table_is_an_error() {
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(matches!(
            parse_album_table(&doc, BASE, 10),
            Err(ScrapeError::AlbumTableMissing)
        ));
    }

    #[test]
    fn parses_track_rows_skipping_header_and_footer() {
        let doc = Html::parse_document(ALBUM_HTML);
        let tracks = parse_track_table(&doc).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "Opening Theme");
        assert_eq!(tracks[0].duration.as_deref(), Some("2:45"));
        assert_eq!(tracks[1].name, "Hidden Song");
        assert_eq!(tracks[1].duration, None);
    }

    #[test]
    fn missing_track_table_is_an_error() {
        let doc = Html::parse_document("<html><body><table></table></body></html>");
        assert!(matches!(
            parse_track_table(&doc),
            Err(ScrapeError::TrackTableMissing)
        ));
    }

    #[test]
    fn collects_cover_links() {
        let doc = Html::parse_document(ALBUM_HTML);
        let covers = parse_cover_links(&doc, BASE);
        assert_eq!(
            covers,
            vec![
                "https://downloads.khinsider.com/images/covers/front.jpg".to_string(),
                "https://cdn.example.com/back.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn finds_main_cover() {
        let doc = Html::parse_document(ALBUM_HTML);
        assert_eq!(
            parse_main_cover(&doc, BASE).as_deref(),
            Some("https://downloads.khinsider.com/images/covers/main.jpg")
        );
        let empty = Html::parse_document("<html><body></body></html>");
        assert_eq!(parse_main_cover(&empty, BASE), None);
        assert!(parse_cover_links(&empty, BASE).is_empty());
    }
}
