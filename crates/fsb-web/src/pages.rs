//! Server-rendered HTML.

use fsb_core::{formatting::escape_html, formatting::get_readable_file_size, store::FileRecord};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>File Stream Bot</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            color: #333;
        }
        .container {
            background: rgba(255, 255, 255, 0.95);
            padding: 3rem;
            border-radius: 20px;
            box-shadow: 0 20px 40px rgba(0, 0, 0, 0.1);
            text-align: center;
            max-width: 600px;
            width: 90%;
        }
        h1 { font-size: 3rem; margin-bottom: 1rem; color: #667eea; }
        .emoji { font-size: 5rem; margin-bottom: 1rem; }
        p { font-size: 1.2rem; color: #666; margin-bottom: 2rem; line-height: 1.6; }
        .features {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
            gap: 1rem;
            margin: 2rem 0;
        }
        .feature { padding: 1.5rem; background: #eef1f7; border-radius: 15px; }
        .feature-icon { font-size: 2rem; margin-bottom: 0.5rem; }
        .feature-title { font-weight: 600; margin-bottom: 0.25rem; }
        .feature-desc { font-size: 0.9rem; color: #666; }
        .btn {
            display: inline-block;
            padding: 1rem 2rem;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            text-decoration: none;
            border-radius: 30px;
            font-weight: 600;
        }
        .stats {
            margin-top: 3rem;
            padding-top: 2rem;
            border-top: 1px solid #e0e0e0;
            display: flex;
            justify-content: space-around;
        }
        .stat-number { font-size: 2rem; font-weight: 700; color: #667eea; }
        .stat-label { font-size: 0.9rem; color: #666; margin-top: 0.25rem; }
    </style>
</head>
<body>
    <div class="container">
        <div class="emoji">📁</div>
        <h1>File Stream Bot</h1>
        <p>Transform your Telegram files into instant streaming links!</p>
        <div class="features">
            <div class="feature">
                <div class="feature-icon">🚀</div>
                <div class="feature-title">Fast Streaming</div>
                <div class="feature-desc">Files straight from Telegram</div>
            </div>
            <div class="feature">
                <div class="feature-icon">📊</div>
                <div class="feature-title">Statistics</div>
                <div class="feature-desc">Track views and downloads</div>
            </div>
            <div class="feature">
                <div class="feature-icon">🔗</div>
                <div class="feature-title">Short Links</div>
                <div class="feature-desc">One link per file</div>
            </div>
        </div>
        <a href="https://t.me/{bot_username}" class="btn">Start Using Bot</a>
        <div class="stats">
            <div class="stat">
                <div class="stat-number" id="total-files">0</div>
                <div class="stat-label">Total Files</div>
            </div>
            <div class="stat">
                <div class="stat-number" id="total-users">0</div>
                <div class="stat-label">Users</div>
            </div>
            <div class="stat">
                <div class="stat-number" id="total-views">0</div>
                <div class="stat-label">Total Views</div>
            </div>
        </div>
    </div>
    <script>
        function animateNumber(id, target) {
            let current = 0;
            const step = Math.max(target / 50, 1);
            const timer = setInterval(() => {
                current = Math.min(current + step, target);
                document.getElementById(id).textContent = Math.floor(current).toLocaleString();
                if (current >= target) clearInterval(timer);
            }, 20);
        }
        fetch('/stats')
            .then(res => res.json())
            .then(data => {
                animateNumber('total-files', data.total_files);
                animateNumber('total-users', data.total_users);
                animateNumber('total-views', data.total_views);
            });
    </script>
</body>
</html>
"#;

const DEFAULT_BOT_USERNAME: &str = "filestream_bot";

pub fn index(bot_username: &str) -> String {
    let name = if bot_username.is_empty() {
        DEFAULT_BOT_USERNAME
    } else {
        bot_username
    };
    INDEX_HTML.replace("{bot_username}", &escape_html(name))
}

/// Card for a short link. Both hrefs are full links with the file name
/// already percent-encoded.
pub fn file_card(file: &FileRecord, stream_href: &str, download_href: &str) -> String {
    let name = escape_html(file.file_name.as_deref().unwrap_or("unnamed"));
    let size = get_readable_file_size(file.file_size.max(0) as u64);
    let kind = escape_html(&file.file_type);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f5f5;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
        }}
        .card {{
            background: white;
            padding: 2rem;
            border-radius: 15px;
            box-shadow: 0 5px 20px rgba(0, 0, 0, 0.1);
            max-width: 500px;
            width: 90%;
            text-align: center;
        }}
        .file-icon {{ font-size: 4rem; margin-bottom: 1rem; }}
        h1 {{ font-size: 1.5rem; margin-bottom: 1rem; word-break: break-word; }}
        .info {{ color: #666; margin-bottom: 2rem; }}
        .info-item {{ margin: 0.5rem 0; }}
        .buttons {{ display: flex; gap: 1rem; justify-content: center; flex-wrap: wrap; }}
        .btn {{
            display: inline-block;
            padding: 0.75rem 1.5rem;
            background: #667eea;
            color: white;
            text-decoration: none;
            border-radius: 8px;
        }}
        .btn-secondary {{ background: #48bb78; }}
    </style>
</head>
<body>
    <div class="card">
        <div class="file-icon">📄</div>
        <h1>{name}</h1>
        <div class="info">
            <div class="info-item">📊 Size: {size}</div>
            <div class="info-item">📁 Type: {kind}</div>
            <div class="info-item">👁 Views: {views}</div>
            <div class="info-item">📥 Downloads: {downloads}</div>
        </div>
        <div class="buttons">
            <a href="{stream}" class="btn">▶️ Stream</a>
            <a href="{download}" class="btn btn-secondary">📥 Download</a>
        </div>
    </div>
</body>
</html>
"#,
        views = file.views,
        downloads = file.downloads,
        stream = escape_html(stream_href),
        download = escape_html(download_href),
    )
}
