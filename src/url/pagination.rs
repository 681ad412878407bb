/// Builds the URL of one page of a category listing
///
/// Page 1 is the base URL unchanged. Later pages append a `page=N` query
/// parameter, joined with `&` when the base URL already has a query string
/// and with `?` otherwise. Page 0 is treated like page 1.
///
/// # Examples
///
/// ```
/// use listing_harvester::url::page_url;
///
/// assert_eq!(page_url("https://www.olx.ua/uk/hobbi/", 1), "https://www.olx.ua/uk/hobbi/");
/// assert_eq!(page_url("https://www.olx.ua/uk/hobbi/", 3), "https://www.olx.ua/uk/hobbi/?page=3");
/// ```
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        return base_url.to_string();
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", base_url, separator, page)
}
