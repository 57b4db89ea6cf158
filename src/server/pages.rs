//! HTML pages served by the mosaic server.
//!
//! The upload page carries its own results view: a small script posts the
//! form to `/mosaic` and shows the original next to the returned mosaic
//! together with the generation time reported in the response headers.

/// Tile size pre-filled in the upload form.
pub const DEFAULT_FORM_TILE_SIZE: u32 = 16;

/// Generate the upload page.
///
/// # Arguments
///
/// * `max_tile_size` - Upper bound offered by the tile size input
/// * `default_quality` - Quality pre-filled in the form
/// * `tile_count` - Number of indexed tiles, shown in the header
pub fn upload_page_html(max_tile_size: u32, default_quality: u8, tile_count: usize) -> String {
    let default_tile_size = DEFAULT_FORM_TILE_SIZE.min(max_tile_size);
    let corpus_note = if tile_count == 0 {
        "No tiles indexed yet. Add images to the tile directory and reload.".to_string()
    } else {
        format!("{} tiles indexed", tile_count)
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Photo Mosaic</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            background: #0f0f0f;
            color: #e5e5e5;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            padding: 32px;
        }}
        h1 {{
            font-size: 20px;
            font-weight: 600;
            margin-bottom: 4px;
        }}
        .corpus {{
            color: #888;
            font-size: 13px;
            margin-bottom: 24px;
        }}
        form {{
            display: flex;
            gap: 16px;
            align-items: flex-end;
            flex-wrap: wrap;
            margin-bottom: 24px;
        }}
        label {{
            display: flex;
            flex-direction: column;
            gap: 6px;
            font-size: 12px;
            color: #aaa;
        }}
        input {{
            background: #1a1a1a;
            color: #e5e5e5;
            border: 1px solid #333;
            border-radius: 4px;
            padding: 6px 8px;
        }}
        button {{
            background: #2563eb;
            color: white;
            border: none;
            border-radius: 4px;
            padding: 8px 16px;
            cursor: pointer;
        }}
        button:disabled {{
            background: #444;
            cursor: wait;
        }}
        #status {{
            font-size: 13px;
            margin-bottom: 16px;
            min-height: 18px;
        }}
        #status.error {{
            color: #f87171;
        }}
        .results {{
            display: grid;
            grid-template-columns: 1fr 1fr;
            gap: 16px;
        }}
        .results figure {{
            background: #1a1a1a;
            border-radius: 4px;
            padding: 8px;
        }}
        .results img {{
            width: 100%;
            display: block;
        }}
        figcaption {{
            font-size: 12px;
            color: #888;
            margin-top: 6px;
        }}
    </style>
</head>
<body>
    <h1>Photo Mosaic</h1>
    <div class="corpus">{corpus_note}</div>

    <form id="mosaic-form">
        <label>Image
            <input type="file" name="image" accept="image/jpeg,image/png" required>
        </label>
        <label>Tile size
            <input type="number" name="tile_size" min="1" max="{max_tile_size}" value="{default_tile_size}" required>
        </label>
        <label>Quality
            <input type="number" name="quality" min="1" max="100" value="{default_quality}">
        </label>
        <button type="submit">Generate</button>
    </form>

    <div id="status"></div>

    <div class="results" id="results" hidden>
        <figure>
            <img id="original" alt="Original">
            <figcaption>Original</figcaption>
        </figure>
        <figure>
            <img id="mosaic" alt="Mosaic">
            <figcaption id="mosaic-caption">Mosaic</figcaption>
        </figure>
    </div>

    <script>
        const form = document.getElementById('mosaic-form');
        const status = document.getElementById('status');
        const button = form.querySelector('button');
        const original = document.getElementById('original');
        const mosaic = document.getElementById('mosaic');
        const caption = document.getElementById('mosaic-caption');
        const results = document.getElementById('results');

        function showStatus(text, isError) {{
            status.textContent = text;
            status.className = isError ? 'error' : '';
        }}

        form.addEventListener('submit', async (event) => {{
            event.preventDefault();
            const data = new FormData(form);
            const file = data.get('image');

            button.disabled = true;
            showStatus('Generating mosaic...', false);

            try {{
                const response = await fetch('/mosaic', {{ method: 'POST', body: data }});
                if (!response.ok) {{
                    let message = response.statusText;
                    try {{
                        const body = await response.json();
                        message = body.message || message;
                    }} catch (_) {{}}
                    showStatus('Error: ' + message, true);
                    return;
                }}

                const blob = await response.blob();
                const duration = response.headers.get('X-Mosaic-Duration-Ms');
                const blocks = response.headers.get('X-Mosaic-Blocks');

                URL.revokeObjectURL(original.src);
                URL.revokeObjectURL(mosaic.src);
                original.src = URL.createObjectURL(file);
                mosaic.src = URL.createObjectURL(blob);
                caption.textContent = 'Mosaic (' + blocks + ' blocks)';
                results.hidden = false;
                showStatus('Mosaic generated in ' + (duration / 1000).toFixed(3) + ' seconds', false);
            }} catch (err) {{
                showStatus('Error: ' + err.message, true);
            }} finally {{
                button.disabled = false;
            }}
        }});
    </script>
</body>
</html>"##,
        corpus_note = corpus_note,
        max_tile_size = max_tile_size,
        default_tile_size = default_tile_size,
        default_quality = default_quality,
    )
}
