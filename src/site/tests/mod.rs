use super::parse::{is_login_required, parse_detail_page, parse_list_page};
use super::{HttpSiteClient, ListFetch, SiteClient, extract_author, html_to_text, parse_publish_time};
use crate::config::SiteConfig;
use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PAGE_HTML: &str = r#"
<html><head><title>会员中心</title></head><body>
<a class="a1">共 128 条</a>
<table>
<tr><td colspan="5">标题行</td></tr>
<tr>
  <td align="center">1001</td>
  <td align="left"><a href="/show-1001.html">黟县乡村旅游升温</a></td>
  <td align="center">旅游</td>
  <td align="center">2025-12-24 19:49:52</td>
  <td align="center">通过</td>
</tr>
<tr>
  <td align="center">1002</td>
  <td align="left"><a href="https://other.example.com/show-1002.html">休宁茶产业观察</a></td>
  <td align="center">经济</td>
  <td align="center">2025-12-24 18:00:00</td>
  <td align="center">待审核</td>
</tr>
<tr>
  <td align="center"></td>
  <td align="left"><a href="/show-none.html">无编号行</a></td>
  <td align="center">经济</td>
  <td align="center">2025-12-24 17:00:00</td>
  <td align="center">通过</td>
</tr>
</table>
</body></html>
"#;

const DETAIL_PAGE_HTML: &str = r#"
<html><head><title>新闻详情</title></head><body>
<div class="crumbs"><a href="/">首页</a><a href="/jingji">经济</a></div>
<div class="article-hd"><h1>屯溪老街商圈焕新</h1></div>
<span class="time">2025-12-24 19:49:52</span>
<div class="source">来源：安徽财经网&nbsp;编辑：王编</div>
<div id="text_content"><p>正文第一段。</p><script>var tracked = 1;</script><p>记者在现场报道。（李四）</p></div>
</body></html>
"#;

const AUTH_WALL_HTML: &str =
    "<html><head><title>提示信息</title></head><body>请先登录</body></html>";

#[test]
fn list_page_parses_rows_and_total() {
    let page = parse_list_page(3, LIST_PAGE_HTML, "https://www.ahcaijing.com").unwrap();

    assert_eq!(page.page, 3);
    assert_eq!(page.total_count, 128);
    // The id-less row is dropped; status filtering is not this layer's job
    assert_eq!(page.articles.len(), 2);

    let first = &page.articles[0];
    assert_eq!(first.source_id, "1001");
    assert_eq!(first.title, "黟县乡村旅游升温");
    assert_eq!(first.category, "旅游");
    assert_eq!(first.site_status, "通过");
    // Relative links are resolved against the base URL
    assert_eq!(first.source_url, "https://www.ahcaijing.com/show-1001.html");

    // Absolute links pass through untouched
    assert_eq!(
        page.articles[1].source_url,
        "https://other.example.com/show-1002.html"
    );
    assert_eq!(page.articles[1].site_status, "待审核");
}

#[test]
fn list_page_parses_publish_time_as_beijing() {
    let page = parse_list_page(1, LIST_PAGE_HTML, "https://www.ahcaijing.com").unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 12, 24, 11, 49, 52).unwrap();
    assert_eq!(page.articles[0].publish_time, Some(expected));
}

#[test]
fn empty_list_page_yields_no_articles() {
    let page = parse_list_page(1, "<html><body></body></html>", "https://x.example").unwrap();
    assert_eq!(page.total_count, 0);
    assert!(page.articles.is_empty());
}

#[test]
fn auth_wall_is_detected_by_title() {
    assert!(is_login_required(AUTH_WALL_HTML).unwrap());
    assert!(!is_login_required(LIST_PAGE_HTML).unwrap());
}

#[test]
fn detail_page_parses_all_fields() {
    let detail = parse_detail_page("1001", DETAIL_PAGE_HTML, &SiteConfig::default()).unwrap();

    assert_eq!(detail.source_id, "1001");
    assert_eq!(detail.title, "屯溪老街商圈焕新");
    assert!(detail.content_html.contains("正文第一段"));
    // Script bodies never leak into the plain text
    assert!(!detail.content_text.contains("tracked"));
    assert!(detail.content_text.contains("正文第一段。"));
    assert_eq!(detail.source_name, "安徽财经网");
    assert_eq!(detail.category, "经济");
    assert_eq!(detail.author, "李四");
    // Region derived from the title keyword
    assert_eq!(detail.region, "屯溪区");
    assert_eq!(
        detail.publish_time,
        Some(Utc.with_ymd_and_hms(2025, 12, 24, 11, 49, 52).unwrap())
    );
}

#[test]
fn detail_page_without_keyword_falls_back_to_default_region() {
    let html = DETAIL_PAGE_HTML.replace("屯溪老街商圈焕新", "全省经济运行平稳");
    let detail = parse_detail_page("1001", &html, &SiteConfig::default()).unwrap();
    assert_eq!(detail.region, "黄山");
}

#[test]
fn empty_detail_page_is_an_error() {
    let result = parse_detail_page("1001", "<html><body></body></html>", &SiteConfig::default());
    assert!(result.is_err());
}

#[test]
fn author_extraction_prefers_last_group() {
    assert_eq!(extract_author("报道。（张三）补记。（李四）"), "李四");
    assert_eq!(extract_author("report (Tom) more (Jane)"), "Jane");
    // ASCII parens are checked first, matching the site convention
    assert_eq!(extract_author("正文 (Tom)（李四）"), "Tom");
    assert_eq!(extract_author("无作者信息"), "");
}

#[test]
fn html_to_text_strips_markup_and_collapses_whitespace() {
    let text = html_to_text("<p>第一段</p>\n\n<style>.a{}</style><p>第二段  补充</p>");
    assert_eq!(text, "第一段 第二段 补充");
}

#[test]
fn publish_time_parsing() {
    let expected = Utc.with_ymd_and_hms(2025, 12, 24, 11, 49, 52).unwrap();
    assert_eq!(parse_publish_time("2025-12-24 19:49:52"), Some(expected));
    assert_eq!(
        parse_publish_time("2025-12-24T11:49:52+00:00"),
        Some(expected)
    );
    assert_eq!(parse_publish_time("昨天"), None);
    assert_eq!(parse_publish_time(""), None);
}

fn gbk_body(html: &str) -> Vec<u8> {
    let (encoded, _, _) = encoding_rs::GBK.encode(html);
    encoded.into_owned()
}

fn test_site(server: &MockServer) -> SiteConfig {
    SiteConfig {
        base_url: server.uri(),
        ..Default::default()
    }
}

#[tokio::test]
async fn http_client_fetches_and_decodes_gbk_list_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gbk_body(LIST_PAGE_HTML)))
        .mount(&server)
        .await;

    let client = HttpSiteClient::new(test_site(&server)).unwrap();
    let fetch = client.fetch_list_page(2, "session=abc").await.unwrap();

    match fetch {
        ListFetch::Page(page) => {
            assert_eq!(page.page, 2);
            assert_eq!(page.articles.len(), 2);
            assert_eq!(page.articles[0].site_status, "通过");
        }
        ListFetch::AuthRequired => panic!("expected a parsed page"),
    }
}

#[tokio::test]
async fn http_client_detects_auth_wall() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gbk_body(AUTH_WALL_HTML)))
        .mount(&server)
        .await;

    let client = HttpSiteClient::new(test_site(&server)).unwrap();
    let fetch = client.fetch_list_page(1, "expired=1").await.unwrap();
    assert_eq!(fetch, ListFetch::AuthRequired);
}

#[tokio::test]
async fn http_client_surfaces_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = HttpSiteClient::new(test_site(&server)).unwrap();
    let result = client.fetch_list_page(1, "session=abc").await;
    assert!(result.is_err());
}
